//! Interactive estimate shell.
//!
//! Reads one command per line from stdin. Command failures are reported and
//! the shell keeps running; only `quit` or end of input leave it.

use std::io::Write;
use std::path::PathBuf;

use md_estimator::Estimator;
use md_estimator::cart::Cart;
use md_estimator_core::{ItemId, format_amount};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::items::{self, write_catalog};
use super::{CliError, require_user};

const HELP: &str = "\
Commands:
  items [text]        List catalog items, optionally filtered by name
  refresh             Reload the catalog
  add <id> [qty]      Add an item to the estimate (default qty 1)
  qty <id> <n>        Set the quantity of a line (0 removes it)
  remove <id>         Remove a line
  customer <name>     Set the customer name
  cart                Show the estimate
  clear               Empty the estimate
  export [dir]        Save the estimate as JSON (default: current directory)

Catalog (admin only):
  item add <price> <name>          Create an item
  item update <id> <price> <name>  Replace an item's name and price
  item delete <id>                 Delete an item
  help                Show this help
  quit                Leave the shell";

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Items(String),
    Refresh,
    Add { id: ItemId, quantity: u32 },
    Quantity { id: ItemId, quantity: u32 },
    Remove(ItemId),
    Customer(String),
    Cart,
    Clear,
    Export(Option<PathBuf>),
    ItemAdd { name: String, price: String },
    ItemUpdate { id: ItemId, name: String, price: String },
    ItemDelete(ItemId),
    Quit,
}

const ITEM_USAGE: &str = "item add <price> <name> | item update <id> <price> <name> | item delete <id>";

/// Why a shell line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown command '{0}'. Type `help` for a list of commands")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid quantity '{0}'")]
    Quantity(String),
}

impl ShellCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = split_word(line);
        let mut args = rest.split_whitespace();

        let command = match verb.to_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "items" | "ls" => Self::Items(rest.to_string()),
            "refresh" => Self::Refresh,
            "add" => {
                let id = args.next().ok_or(ParseError::Usage("add <id> [qty]"))?;
                let quantity = args.next().map_or(Ok(1), parse_quantity)?;
                Self::Add {
                    id: ItemId::new(id),
                    quantity,
                }
            }
            "qty" => {
                let (Some(id), Some(quantity)) = (args.next(), args.next()) else {
                    return Err(ParseError::Usage("qty <id> <n>"));
                };
                Self::Quantity {
                    id: ItemId::new(id),
                    quantity: parse_quantity(quantity)?,
                }
            }
            "remove" | "rm" => {
                let id = args.next().ok_or(ParseError::Usage("remove <id>"))?;
                Self::Remove(ItemId::new(id))
            }
            "customer" => Self::Customer(rest.to_string()),
            "cart" => Self::Cart,
            "clear" => Self::Clear,
            "export" => Self::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "item" => parse_item(rest)?,
            "quit" | "exit" => Self::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

/// Parse the arguments of `item`. Names run to the end of the line.
fn parse_item(rest: &str) -> Result<ShellCommand, ParseError> {
    let (action, args) = split_word(rest);
    match action.to_lowercase().as_str() {
        "add" => {
            let (price, name) = split_word(args);
            if name.is_empty() {
                return Err(ParseError::Usage("item add <price> <name>"));
            }
            Ok(ShellCommand::ItemAdd {
                name: name.to_string(),
                price: price.to_string(),
            })
        }
        "update" => {
            let (id, args) = split_word(args);
            let (price, name) = split_word(args);
            if name.is_empty() {
                return Err(ParseError::Usage("item update <id> <price> <name>"));
            }
            Ok(ShellCommand::ItemUpdate {
                id: ItemId::new(id),
                name: name.to_string(),
                price: price.to_string(),
            })
        }
        "delete" | "rm" => {
            let (id, _) = split_word(args);
            if id.is_empty() {
                return Err(ParseError::Usage("item delete <id>"));
            }
            Ok(ShellCommand::ItemDelete(ItemId::new(id)))
        }
        _ => Err(ParseError::Usage(ITEM_USAGE)),
    }
}

/// First whitespace-separated word and the trimmed remainder.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    s.split_once(char::is_whitespace)
        .map_or((s, ""), |(word, rest)| (word, rest.trim()))
}

fn parse_quantity(s: &str) -> Result<u32, ParseError> {
    s.parse().map_err(|_| ParseError::Quantity(s.to_string()))
}

/// Run the shell until `quit` or end of input.
pub async fn run(estimator: &Estimator, out: &mut impl Write) -> Result<(), CliError> {
    let user = require_user(estimator)?;

    if let Err(e) = estimator.start().await {
        tracing::warn!(error = %e, "Initial catalog load failed");
        writeln!(out, "Could not load the catalog: {e}")?;
    }
    writeln!(
        out,
        "Signed in as {}. {} items in catalog. Type `help` for commands.",
        user.name,
        estimator.catalog().len()
    )?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(out, "mdq> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };

        if command == ShellCommand::Quit {
            break;
        }

        if let Err(e) = execute(estimator, command, out).await {
            tracing::debug!(error = %e, "Shell command failed");
            writeln!(out, "Error: {e}")?;
        }
    }
    Ok(())
}

/// Execute one command against the estimator.
pub async fn execute(
    estimator: &Estimator,
    command: ShellCommand,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        ShellCommand::Help => writeln!(out, "{HELP}")?,
        ShellCommand::Items(query) => write_catalog(estimator.catalog(), &query, out)?,
        ShellCommand::Refresh => {
            estimator.catalog().refresh().await?;
            writeln!(out, "{} items in catalog", estimator.catalog().len())?;
        }
        ShellCommand::Add { id, quantity } => {
            match estimator.add_to_cart(&id, quantity).await? {
                Some(line) => writeln!(
                    out,
                    "{} x{} ({})",
                    line.item.name,
                    line.quantity,
                    format_amount(line.line_total())
                )?,
                None => writeln!(out, "Nothing added")?,
            }
        }
        ShellCommand::Quantity { id, quantity } => {
            estimator.cart().await.set_quantity(&id, quantity);
            write_cart(&*estimator.cart().await, out)?;
        }
        ShellCommand::Remove(id) => {
            estimator.cart().await.remove(&id);
            write_cart(&*estimator.cart().await, out)?;
        }
        ShellCommand::Customer(name) => {
            estimator.cart().await.set_customer_name(name.clone());
            writeln!(out, "Customer set to '{name}'")?;
        }
        ShellCommand::Cart => write_cart(&*estimator.cart().await, out)?,
        ShellCommand::Clear => {
            estimator.cart().await.clear();
            writeln!(out, "Estimate cleared")?;
        }
        ShellCommand::Export(dir) => {
            let snapshot = estimator.export_today().await?;
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            let path = snapshot.write_to(&dir)?;
            writeln!(
                out,
                "Estimate #{} saved to {} (total {})",
                snapshot.reference,
                path.display(),
                snapshot.display_total()
            )?;
        }
        ShellCommand::ItemAdd { name, price } => items::add(estimator, &name, &price, out).await?,
        ShellCommand::ItemUpdate { id, name, price } => {
            items::update(estimator, id.as_str(), &name, &price, out).await?;
        }
        ShellCommand::ItemDelete(id) => items::delete(estimator, id.as_str(), out).await?,
        ShellCommand::Quit => {}
    }
    Ok(())
}

/// Print the estimate.
pub fn write_cart(cart: &Cart, out: &mut impl Write) -> std::io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Estimate is empty");
    }
    if !cart.customer_name().is_empty() {
        writeln!(out, "Customer: {}", cart.customer_name())?;
    }
    writeln!(
        out,
        "{:<14} {:<30} {:>6} {:>14} {:>14}",
        "ID", "NAME", "QTY", "UNIT", "AMOUNT"
    )?;
    for line in cart.lines() {
        writeln!(
            out,
            "{:<14} {:<30} {:>6} {:>14} {:>14}",
            line.item.id.as_str(),
            line.item.name,
            line.quantity,
            line.item.price.display(),
            format_amount(line.line_total())
        )?;
    }
    writeln!(
        out,
        "{} items, total {}",
        cart.item_count(),
        cart.display_total()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use md_estimator::{CatalogConfig, DeleteError, HttpCatalogGateway, SessionStore, UserDirectory};
    use md_estimator_core::{CatalogItem, Price};

    use super::*;

    /// An estimator whose catalog service is never reachable.
    fn offline_estimator(dir: &std::path::Path) -> Estimator {
        let config = CatalogConfig::new("http://127.0.0.1:9/api").unwrap();
        Estimator::new(
            HttpCatalogGateway::new(&config).unwrap(),
            SessionStore::new(dir.join("session.json")),
            UserDirectory::default(),
        )
    }

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(ShellCommand::parse("   "), Ok(None));
    }

    #[test]
    fn test_parse_add_defaults_quantity() {
        assert_eq!(
            ShellCommand::parse("add 12").unwrap(),
            Some(ShellCommand::Add {
                id: ItemId::new("12"),
                quantity: 1
            })
        );
        assert_eq!(
            ShellCommand::parse("ADD 12 4").unwrap(),
            Some(ShellCommand::Add {
                id: ItemId::new("12"),
                quantity: 4
            })
        );
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        assert_eq!(
            ShellCommand::parse("add"),
            Err(ParseError::Usage("add <id> [qty]"))
        );
        assert_eq!(
            ShellCommand::parse("qty 12 -1"),
            Err(ParseError::Quantity("-1".to_string()))
        );
        assert_eq!(
            ShellCommand::parse("qty 12"),
            Err(ParseError::Usage("qty <id> <n>"))
        );
        assert_eq!(
            ShellCommand::parse("checkout"),
            Err(ParseError::Unknown("checkout".to_string()))
        );
    }

    #[test]
    fn test_parse_free_text_arguments() {
        assert_eq!(
            ShellCommand::parse("customer  Mr. Sharma ").unwrap(),
            Some(ShellCommand::Customer("Mr. Sharma".to_string()))
        );
        assert_eq!(
            ShellCommand::parse("items wall panel").unwrap(),
            Some(ShellCommand::Items("wall panel".to_string()))
        );
        assert_eq!(
            ShellCommand::parse("export").unwrap(),
            Some(ShellCommand::Export(None))
        );
        assert_eq!(
            ShellCommand::parse("export /tmp/quotes").unwrap(),
            Some(ShellCommand::Export(Some(PathBuf::from("/tmp/quotes"))))
        );
        assert_eq!(ShellCommand::parse("exit").unwrap(), Some(ShellCommand::Quit));
    }

    #[test]
    fn test_parse_item_commands() {
        assert_eq!(
            ShellCommand::parse("item add 1450 Wall Panel").unwrap(),
            Some(ShellCommand::ItemAdd {
                name: "Wall Panel".to_string(),
                price: "1450".to_string()
            })
        );
        assert_eq!(
            ShellCommand::parse("item update 12 1500  Wall Panel XL ").unwrap(),
            Some(ShellCommand::ItemUpdate {
                id: ItemId::new("12"),
                name: "Wall Panel XL".to_string(),
                price: "1500".to_string()
            })
        );
        assert_eq!(
            ShellCommand::parse("ITEM delete 12").unwrap(),
            Some(ShellCommand::ItemDelete(ItemId::new("12")))
        );
        assert_eq!(
            ShellCommand::parse("item add 1450"),
            Err(ParseError::Usage("item add <price> <name>"))
        );
        assert_eq!(
            ShellCommand::parse("item delete"),
            Err(ParseError::Usage("item delete <id>"))
        );
        assert_eq!(ShellCommand::parse("item"), Err(ParseError::Usage(ITEM_USAGE)));
    }

    #[tokio::test]
    async fn test_item_commands_require_admin() {
        let dir = tempfile::tempdir().unwrap();
        let estimator = offline_estimator(dir.path());
        estimator.login("emp").unwrap();
        let mut out = Vec::new();

        let err = execute(
            &estimator,
            ShellCommand::ItemDelete(ItemId::new("12")),
            &mut out,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CliError::Forbidden(username) if username == "emp"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_item_delete_reaches_catalog_for_admin() {
        let dir = tempfile::tempdir().unwrap();
        let estimator = offline_estimator(dir.path());
        estimator.login("admin").unwrap();
        estimator.cart().await.add(
            CatalogItem::new("7", "Panel", Price::parse("500").unwrap()),
            2,
        );
        let mut out = Vec::new();

        let err = execute(
            &estimator,
            ShellCommand::ItemDelete(ItemId::placeholder("abc1234")),
            &mut out,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CliError::Delete(DeleteError::Unsaved)));
        assert_eq!(estimator.cart().await.total(), rust_decimal::Decimal::from(1000));
    }

    #[test]
    fn test_write_cart() {
        let mut cart = Cart::new();
        cart.set_customer_name("Asha");
        cart.add(CatalogItem::new("1", "Panel", Price::parse("500").unwrap()), 3);
        let mut out = Vec::new();

        write_cart(&cart, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Customer: Asha\n"));
        assert!(text.contains("₹1500.00"));
        assert!(text.ends_with("3 items, total ₹1500.00\n"));
    }
}
