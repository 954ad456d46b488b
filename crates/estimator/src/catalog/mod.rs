//! Remote item catalog: normalization, gateway and synchronization.
//!
//! # Architecture
//!
//! - The catalog service is the source of truth - identities are assigned
//!   server-side and every successful mutation is followed by a full refetch
//! - [`normalize_catalog`] turns whatever JSON shape the service returns into
//!   canonical [`CatalogItem`](md_estimator_core::CatalogItem)s
//! - [`CatalogGateway`] is the seam between the synchronization core and the
//!   network; [`HttpCatalogGateway`] is the `reqwest` implementation
//! - [`CatalogSync`] owns the in-memory catalog and sequences gateway calls
//!
//! # Example
//!
//! ```rust,ignore
//! use md_estimator::catalog::{CatalogSync, HttpCatalogGateway};
//!
//! let gateway = HttpCatalogGateway::new(&config.catalog)?;
//! let catalog = CatalogSync::new(gateway);
//!
//! catalog.refresh().await?;
//! let panels = catalog.search("panel");
//! ```

mod gateway;
mod normalize;
mod sync;
#[cfg(test)]
pub(crate) mod test_support;

pub use gateway::{CatalogGateway, HttpCatalogGateway};
pub use normalize::normalize_catalog;
pub use sync::{CatalogSync, DELETE_CONFIRMATION};

use thiserror::Error;

/// Errors from reading or mutating the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Catalog service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Excerpt of the response body.
        body: String,
    },

    /// A success response did not carry JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The HTTP client could not be built from configuration.
    #[error("Catalog client configuration error: {0}")]
    Config(String),
}

/// Why an item could not be deleted.
///
/// The `Display` output is the human-readable message shown to the user, so
/// the three tiers stay distinguishable by text as well as by variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteError {
    /// The item carries a placeholder identity and was never saved.
    #[error("cannot delete unsaved item")]
    Unsaved,

    /// The service answered with a non-success status.
    #[error("{message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// No response was received.
    #[error("{0}")]
    Transport(String),
}

impl DeleteError {
    /// Message used when a transport failure carries no text of its own.
    pub const GENERIC_NETWORK_ERROR: &'static str = "network error";

    /// Classify a transport-level failure.
    #[must_use]
    pub fn transport(error: &reqwest::Error) -> Self {
        let message = error.to_string();
        if message.trim().is_empty() {
            Self::Transport(Self::GENERIC_NETWORK_ERROR.to_string())
        } else {
            Self::Transport(message)
        }
    }
}
