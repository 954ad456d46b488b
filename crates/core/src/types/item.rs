//! Catalog items and the validated drafts used to create or edit them.

use serde::{Deserialize, Serialize};

use super::id::ItemId;
use super::price::{Price, PriceError};

/// A purchasable item as listed by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Server-assigned identity, or a placeholder for unsaved records.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Price,
}

impl CatalogItem {
    /// Create a catalog item.
    #[must_use]
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// Errors that can occur when building an [`ItemDraft`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// The name is empty or only whitespace.
    #[error("item name cannot be empty")]
    EmptyName,
    /// The price is missing, malformed or negative.
    #[error(transparent)]
    Price(#[from] PriceError),
}

/// The editable fields of a catalog item, validated for submission.
///
/// ## Constraints
///
/// - Name must contain at least one non-whitespace character (stored trimmed)
/// - Price must be a non-negative number
///
/// ## Examples
///
/// ```
/// use md_estimator_core::ItemDraft;
///
/// assert!(ItemDraft::parse("Wall Panel", "1450").is_ok());
/// assert!(ItemDraft::parse("   ", "1450").is_err());
/// assert!(ItemDraft::parse("Wall Panel", "cheap").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    name: String,
    price: Price,
}

impl ItemDraft {
    /// Build a draft from a name and an already-valid price.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::EmptyName`] if the trimmed name is empty.
    pub fn new(name: &str, price: Price) -> Result<Self, DraftError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DraftError::EmptyName);
        }
        Ok(Self {
            name: name.to_owned(),
            price,
        })
    }

    /// Build a draft from raw form text.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or the price does not parse as a
    /// non-negative number.
    pub fn parse(name: &str, price: &str) -> Result<Self, DraftError> {
        let price = Price::parse(price)?;
        Self::new(name, price)
    }

    /// The trimmed item name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The unit price.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }
}
