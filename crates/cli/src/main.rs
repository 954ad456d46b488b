//! MD Estimator CLI - catalog management and estimate building.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (admin or emp)
//! mdq login admin
//!
//! # List or search the catalog
//! mdq items list
//! mdq items list --search panel
//!
//! # Manage catalog items (admin only)
//! mdq items add "Wall Panel" 1450
//! mdq items update 12 "Wall Panel" 1500
//! mdq items delete 12
//!
//! # Build an estimate interactively
//! mdq shell
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Session management
//! - `items` - Catalog listing and management
//! - `shell` - Interactive estimate builder with export

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use md_estimator::{Estimator, EstimatorConfig};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "mdq")]
#[command(author, version, about = "MD Interior Choice estimator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as a known user
    Login {
        /// Username (`admin` or `emp`)
        username: String,
    },
    /// Sign out and discard the current estimate
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List and manage catalog items
    Items {
        #[command(subcommand)]
        action: ItemsAction,
    },
    /// Start the interactive estimate shell
    Shell,
}

#[derive(Subcommand)]
enum ItemsAction {
    /// List catalog items
    List {
        /// Only show items whose name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Create a catalog item (admin only)
    Add {
        /// Item name
        name: String,
        /// Unit price
        price: String,
    },
    /// Replace an item's name and price (admin only)
    Update {
        /// Item ID
        id: String,
        /// New name
        name: String,
        /// New unit price
        price: String,
    },
    /// Delete a catalog item (admin only)
    Delete {
        /// Item ID
        id: String,
    },
}

/// Initialize Sentry error tracking if `SENTRY_DSN` is configured.
fn init_sentry(config: &EstimatorConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = EstimatorConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Logs go to stderr so command output stays clean on stdout
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "md_estimator=info,md_estimator_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &EstimatorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let estimator = Estimator::from_config(config)?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Login { username } => {
            commands::session::login(&estimator, &username, &mut out)?;
        }
        Commands::Logout => commands::session::logout(&estimator, &mut out).await?,
        Commands::Whoami => commands::session::whoami(&estimator, &mut out)?,
        Commands::Items { action } => match action {
            ItemsAction::List { search } => {
                commands::items::list(&estimator, search.as_deref(), &mut out).await?;
            }
            ItemsAction::Add { name, price } => {
                commands::items::add(&estimator, &name, &price, &mut out).await?;
            }
            ItemsAction::Update { id, name, price } => {
                commands::items::update(&estimator, &id, &name, &price, &mut out).await?;
            }
            ItemsAction::Delete { id } => {
                commands::items::delete(&estimator, &id, &mut out).await?;
            }
        },
        Commands::Shell => commands::shell::run(&estimator, &mut out).await?,
    }
    Ok(())
}
