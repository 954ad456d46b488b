//! The estimate ledger.
//!
//! Lines are snapshots: a line keeps the name and price the item had when it
//! was first added, even if the catalog entry changes later.

use chrono::NaiveDate;
use md_estimator_core::{CatalogItem, ItemId, format_amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::export::{EstimateSnapshot, ExportError};

/// One item in the estimate with its selected quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// The item as it was when added.
    #[serde(flatten)]
    pub item: CatalogItem,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.item.price.times(self.quantity)
    }
}

/// Ordered estimate lines, unique by item identity, plus the customer name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
    customer_name: String,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of `item`.
    ///
    /// An existing line for the same identity is incremented and keeps its
    /// original snapshot; otherwise a new line is appended. Adding zero units
    /// does nothing.
    pub fn add(&mut self, item: CatalogItem, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(line) = self.line_mut(&item.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine { item, quantity });
        }
    }

    /// Drop the line for `id`, if any.
    pub fn remove(&mut self, id: &ItemId) {
        self.lines.retain(|line| &line.item.id != id);
    }

    /// Overwrite the quantity of an existing line in place.
    ///
    /// Zero removes the line. Unknown identities are ignored.
    pub fn set_quantity(&mut self, id: &ItemId, quantity: u32) {
        if quantity == 0 {
            self.remove(id);
        } else if let Some(line) = self.line_mut(id) {
            line.quantity = quantity;
        }
    }

    /// Empty the cart and forget the customer name.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.customer_name.clear();
    }

    /// Sum of every line total.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(CartLine::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Total formatted for display.
    #[must_use]
    pub fn display_total(&self) -> String {
        format_amount(self.total())
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn line(&self, id: &ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.item.id == id)
    }

    /// Selected quantity of `id`, zero if absent.
    #[must_use]
    pub fn quantity_of(&self, id: &ItemId) -> u32 {
        self.line(id).map_or(0, |line| line.quantity)
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Customer the estimate is for.
    #[must_use]
    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    /// Set the customer the estimate is for.
    pub fn set_customer_name(&mut self, name: impl Into<String>) {
        self.customer_name = name.into();
    }

    /// Freeze the cart into an estimate dated `date`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::EmptyEstimate`] if the cart has no lines.
    pub fn snapshot(&self, date: NaiveDate) -> Result<EstimateSnapshot, ExportError> {
        EstimateSnapshot::capture(self, date)
    }

    fn line_mut(&mut self, id: &ItemId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| &line.item.id == id)
    }
}
