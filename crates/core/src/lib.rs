//! MD Estimator Core - Shared domain types.
//!
//! This crate provides the types shared by every estimator component:
//! - `md-estimator` - Catalog synchronization, cart ledger and export snapshot
//! - `md-estimator-cli` - The `mdq` command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! filesystem access. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Item identities, prices, catalog items, drafts and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
