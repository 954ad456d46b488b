//! Catalog item identities.
//!
//! Item identities are opaque strings assigned by the catalog service. Records
//! that arrive without one are given a locally generated placeholder carrying
//! [`PLACEHOLDER_PREFIX`]; such items have never been persisted server-side and
//! cannot be targeted by mutating remote calls.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Reserved prefix marking a locally generated placeholder identity.
pub const PLACEHOLDER_PREFIX: &str = "temp_";

/// Identity of a catalog item.
///
/// # Example
///
/// ```rust
/// # use md_estimator_core::ItemId;
/// let saved = ItemId::new("42");
/// let unsaved = ItemId::placeholder("k3j9x1a");
///
/// assert!(!saved.is_placeholder());
/// assert!(unsaved.is_placeholder());
/// assert_eq!(unsaved.as_str(), "temp_k3j9x1a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an identity from a server-assigned value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a placeholder identity from a random suffix.
    #[must_use]
    pub fn placeholder(suffix: &str) -> Self {
        Self(format!("{PLACEHOLDER_PREFIX}{suffix}"))
    }

    /// Whether this identity was generated locally rather than by the server.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identity and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_server_id_is_not_placeholder() {
        assert!(!ItemId::new("0").is_placeholder());
        assert!(!ItemId::new("64f1c0ffee").is_placeholder());
        // Only the prefix counts, not the substring
        assert!(!ItemId::new("item_temp_1").is_placeholder());
    }

    #[test]
    fn test_placeholder_prefix() {
        let id = ItemId::placeholder("abc");
        assert!(id.is_placeholder());
        assert_eq!(id.to_string(), "temp_abc");
    }

    #[test]
    fn test_serde_transparent() {
        let id = ItemId::new("17");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"17\"");
    }
}
