//! Crate-level error type.

use md_estimator_core::{DraftError, ItemId};
use thiserror::Error;

use crate::catalog::{CatalogError, DeleteError};
use crate::config::ConfigError;
use crate::export::ExportError;
use crate::session::SessionError;

/// Any failure surfaced by the estimator.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog fetch or mutation failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Item delete failed. Displays the user-facing message unchanged.
    #[error(transparent)]
    Delete(#[from] DeleteError),

    /// Item fields failed validation.
    #[error("Invalid item: {0}")]
    Draft(#[from] DraftError),

    /// Login or session persistence failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Estimate export failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// The item is not in the current catalog.
    #[error("Item not found in catalog: {0}")]
    UnknownItem(ItemId),
}

/// Result type alias for estimator operations.
pub type Result<T> = std::result::Result<T, Error>;
