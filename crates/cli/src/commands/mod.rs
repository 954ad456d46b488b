//! Command implementations.
//!
//! Every command writes its user-facing output to the supplied writer and
//! logs through `tracing`.

pub mod items;
pub mod session;
pub mod shell;

use md_estimator::{CatalogError, DeleteError, Estimator, ExportError, SessionError};
use md_estimator_core::{DraftError, Role, User};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// No identity is stored.
    #[error("Not logged in. Run `mdq login <username>` first")]
    NotLoggedIn,

    /// The signed-in user lacks the admin role.
    #[error("This command requires the admin role (signed in as {0})")]
    Forbidden(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Delete(#[from] DeleteError),

    #[error("Invalid item: {0}")]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Estimator(#[from] md_estimator::Error),

    /// Writing command output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// The restored identity, or [`CliError::NotLoggedIn`].
pub fn require_user(estimator: &Estimator) -> Result<User, CliError> {
    estimator.restore_session().ok_or(CliError::NotLoggedIn)
}

/// The restored identity if it has the admin role.
pub fn require_admin(estimator: &Estimator) -> Result<User, CliError> {
    let user = require_user(estimator)?;
    if user.role != Role::Admin {
        return Err(CliError::Forbidden(user.username));
    }
    Ok(user)
}
