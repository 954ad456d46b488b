//! Non-negative unit prices using decimal arithmetic.
//!
//! Prices are held as [`Decimal`] so that cart totals are exact. Rounding to
//! two places happens only when a price is displayed.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency symbol used when displaying prices (Indian rupee).
pub const CURRENCY_SYMBOL: &str = "₹";

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
    /// The input is not a decimal number.
    #[error("price must be a number (got {0:?})")]
    Invalid(String),
}

/// A unit price, guaranteed to be zero or greater.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// The zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Decimal::ZERO {
            return Err(PriceError::Negative);
        }
        // Drop the sign of negative zero so it never displays as "-0"
        Ok(Self(amount.abs()))
    }

    /// Parse a price from user or wire text.
    ///
    /// Accepts plain decimals (`"1499.50"`) and scientific notation (`"1.5e3"`).
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Invalid`] if the text is not a number and
    /// [`PriceError::Negative`] if it is below zero.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let trimmed = s.trim();
        let amount = Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }

    /// Returns the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    ///
    /// Saturates at [`Decimal::MAX`] instead of overflowing.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0.saturating_mul(Decimal::from(quantity))
    }

    /// Format for display, e.g. `₹1500.00`.
    #[must_use]
    pub fn display(&self) -> String {
        format_amount(self.0)
    }
}

/// Format any amount the way prices are displayed, e.g. `₹1500.00`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{CURRENCY_SYMBOL}{:.2}", amount.round_dp(2))
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_prices() {
        assert_eq!(Price::parse("500").unwrap().amount(), Decimal::from(500));
        assert_eq!(
            Price::parse(" 1499.50 ").unwrap().amount(),
            Decimal::new(149_950, 2)
        );
        assert_eq!(Price::parse("1.5e3").unwrap().amount(), Decimal::from(1500));
        assert_eq!(Price::parse("0").unwrap(), Price::ZERO);
    }

    #[test]
    fn test_parse_negative() {
        assert!(matches!(Price::parse("-1"), Err(PriceError::Negative)));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(Price::parse(""), Err(PriceError::Invalid(_))));
        assert!(matches!(Price::parse("12abc"), Err(PriceError::Invalid(_))));
    }

    #[test]
    fn test_times() {
        let price = Price::parse("500").unwrap();
        assert_eq!(price.times(3), Decimal::from(1500));
        assert_eq!(price.times(0), Decimal::ZERO);
    }

    #[test]
    fn test_display_rounds_to_two_places() {
        assert_eq!(Price::parse("1500").unwrap().display(), "₹1500.00");
        assert_eq!(Price::parse("19.999").unwrap().display(), "₹20.00");
        assert_eq!(Price::ZERO.display(), "₹0.00");
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        let result: Result<Price, _> = serde_json::from_str("\"-3\"");
        assert!(result.is_err());
        let price: Price = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(price.amount(), Decimal::new(125, 1));
    }
}
