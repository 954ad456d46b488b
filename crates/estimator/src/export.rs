//! Estimate snapshots handed to the print/PDF collaborator.
//!
//! A snapshot is captured from the cart once and never changes afterwards;
//! editing the cart or the catalog later does not affect it.

use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use md_estimator_core::format_amount;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::cart::{Cart, CartLine};

/// Days an estimate stays valid after it is issued.
pub const VALIDITY_DAYS: u64 = 30;

/// File name stem used when the estimate has no customer name.
const FALLBACK_FILE_STEM: &str = "MD_Interior";

/// Errors from exporting an estimate.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The cart has no lines.
    #[error("cannot export an empty estimate")]
    EmptyEstimate,

    /// The snapshot file could not be written.
    #[error("Export file error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be encoded.
    #[error("Export encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Business details printed on every estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Issuer {
    pub name: &'static str,
    pub website: &'static str,
    pub phone: &'static str,
    pub email: &'static str,
    pub address: &'static str,
}

impl Issuer {
    /// MD Interior Choice, Kaithal.
    pub const MD_INTERIOR_CHOICE: Self = Self {
        name: "MD Interior Choice",
        website: "https://mdinteriorchoice.com",
        phone: "+91 90505 55501",
        email: "mdinteriorchoice@gmail.com",
        address: "New Bus Stand, Karnal Road, Kaithal, Haryana 136027",
    };
}

/// Read-only copy of an estimate at the moment it was exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimateSnapshot {
    pub id: Uuid,
    /// Short reference number shown to the customer.
    pub reference: u32,
    pub customer_name: String,
    pub date: NaiveDate,
    pub valid_until: NaiveDate,
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub item_count: u64,
    pub issuer: Issuer,
}

impl EstimateSnapshot {
    /// Capture the cart as of `date`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::EmptyEstimate`] if the cart has no lines.
    pub fn capture(cart: &Cart, date: NaiveDate) -> Result<Self, ExportError> {
        if cart.is_empty() {
            return Err(ExportError::EmptyEstimate);
        }

        let subtotal = cart.total();
        let tax = Decimal::ZERO;

        Ok(Self {
            id: Uuid::new_v4(),
            reference: rand::rng().random_range(0..100_000),
            customer_name: cart.customer_name().to_string(),
            date,
            valid_until: date.checked_add_days(Days::new(VALIDITY_DAYS)).unwrap_or(date),
            lines: cart.lines().to_vec(),
            subtotal,
            tax,
            total: subtotal + tax,
            item_count: cart.item_count(),
            issuer: Issuer::MD_INTERIOR_CHOICE,
        })
    }

    /// Suggested document name, e.g. `Estimate_Mr__Sharma_2026-10-16.pdf`.
    ///
    /// Every character of the customer name outside `[A-Za-z0-9]` becomes `_`.
    #[must_use]
    pub fn suggested_file_name(&self) -> String {
        let stem: String = self
            .customer_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let stem = if stem.is_empty() {
            FALLBACK_FILE_STEM
        } else {
            stem.as_str()
        };
        format!("Estimate_{stem}_{}.pdf", self.date.format("%Y-%m-%d"))
    }

    /// Total formatted for display.
    #[must_use]
    pub fn display_total(&self) -> String {
        format_amount(self.total)
    }

    /// Encode the snapshot as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Json`] if encoding fails.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the snapshot as JSON into `dir`, named after
    /// [`suggested_file_name`](Self::suggested_file_name) with a `.json`
    /// extension. Returns the written path.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if the file cannot be written.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir
            .join(self.suggested_file_name())
            .with_extension("json");
        std::fs::create_dir_all(dir)?;
        std::fs::write(&path, self.to_json()?)?;
        info!(path = %path.display(), id = %self.id, total = %self.total, "Estimate exported");
        Ok(path)
    }
}
