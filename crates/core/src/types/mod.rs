//! Core types for the estimator.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod item;
pub mod price;
pub mod role;

pub use id::{ItemId, PLACEHOLDER_PREFIX};
pub use item::{CatalogItem, DraftError, ItemDraft};
pub use price::{CURRENCY_SYMBOL, Price, PriceError, format_amount};
pub use role::{Role, User};
