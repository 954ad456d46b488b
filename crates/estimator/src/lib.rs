//! MD Estimator library.
//!
//! Keeps a remotely hosted item catalog and a locally held estimate in step:
//!
//! - [`catalog`] - payload normalization, the remote gateway and the
//!   synchronization core that refetches after every mutation
//! - [`cart`] - the in-memory estimate ledger with snapshot lines
//! - [`session`] - the known user directory and persisted identity
//! - [`export`] - the read-only snapshot handed to the print collaborator
//! - [`state`] - the [`Estimator`](state::Estimator) that owns all of the above
//!   for one session

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod session;
pub mod state;

pub use cart::{Cart, CartLine};
pub use catalog::{CatalogError, CatalogGateway, CatalogSync, DeleteError, HttpCatalogGateway};
pub use config::{CatalogConfig, ConfigError, EstimatorConfig};
pub use error::{Error, Result};
pub use export::{EstimateSnapshot, ExportError};
pub use session::{SessionError, SessionStore, UserDirectory};
pub use state::Estimator;
