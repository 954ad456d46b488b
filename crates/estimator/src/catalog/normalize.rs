//! Conversion of loosely-typed catalog payloads into canonical items.
//!
//! The catalog service has answered with a bare array, a `{ "data": [...] }`
//! wrapper and an `{ "items": [...] }` wrapper at different times, and its
//! records carry either `id` or `_id` with numeric or string values.

use std::collections::HashSet;

use md_estimator_core::{CatalogItem, ItemId, Price, PriceError};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

/// Envelope keys probed, in order, when the payload is not a bare array.
const ENVELOPE_KEYS: [&str; 2] = ["data", "items"];

/// Record keys probed, in order, for an identity.
const IDENTITY_KEYS: [&str; 2] = ["id", "_id"];

/// Length of the random part of a placeholder identity.
const PLACEHOLDER_SUFFIX_LEN: usize = 7;

/// Largest integer an `f64` holds exactly (2^53 - 1).
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_991.0;

/// Convert a catalog payload into an ordered list of items.
///
/// Unrecognised payload shapes produce an empty list rather than an error.
/// Records without an identity receive a placeholder that is unique within
/// this call.
#[must_use]
pub fn normalize_catalog(payload: &Value) -> Vec<CatalogItem> {
    let Some(records) = locate_records(payload) else {
        debug!("Catalog payload has no recognised item list, treating as empty");
        return Vec::new();
    };

    // Placeholders must not collide with identities the server did assign
    let mut taken: HashSet<String> = records
        .iter()
        .filter_map(Value::as_object)
        .filter_map(record_identity)
        .collect();
    let mut rng = rand::rng();

    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let Some(fields) = record.as_object() else {
                warn!(index, "Skipping catalog record that is not an object");
                return None;
            };

            let id = record_identity(fields).map_or_else(
                || fresh_placeholder(&mut rng, &mut taken),
                ItemId::new,
            );

            Some(CatalogItem {
                id,
                name: record_name(fields),
                price: coerce_price(fields.get("price")),
            })
        })
        .collect()
}

/// Find the record array: bare array first, then each envelope key.
fn locate_records(payload: &Value) -> Option<&Vec<Value>> {
    if let Some(records) = payload.as_array() {
        return Some(records);
    }
    ENVELOPE_KEYS
        .iter()
        .find_map(|key| payload.get(key).and_then(Value::as_array))
}

/// Identity of a record, if it has one.
///
/// Presence is an explicit null check: a numeric `0` is a valid identity.
fn record_identity(fields: &Map<String, Value>) -> Option<String> {
    IDENTITY_KEYS.iter().find_map(|key| match fields.get(*key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(number_identity(n)),
        Some(other) => Some(other.to_string()),
    })
}

/// Render a numeric identity; integral floats such as `1.0` render as `1`.
fn number_identity(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT_INT => {
            // Adding zero folds -0.0 into 0.0
            format!("{:.0}", f + 0.0)
        }
        _ => n.to_string(),
    }
}

fn record_name(fields: &Map<String, Value>) -> String {
    fields
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

/// Coerce a raw price to a non-negative amount, defaulting to zero.
fn coerce_price(value: Option<&Value>) -> Price {
    let price = match value {
        Some(Value::Number(n)) => number_price(n),
        Some(Value::String(s)) if s.trim().is_empty() => Some(Price::ZERO),
        Some(Value::String(s)) => Price::parse(s).ok(),
        Some(Value::Bool(true)) => Price::parse("1").ok(),
        _ => None,
    };
    price.unwrap_or(Price::ZERO)
}

/// Price of a JSON number. Negative amounts are dropped silently; numbers
/// outside the decimal range are logged.
fn number_price(n: &Number) -> Option<Price> {
    match Price::parse(&n.to_string()) {
        Ok(price) => Some(price),
        Err(PriceError::Negative) => None,
        Err(e) => {
            warn!(price = %n, error = %e, "Catalog price is not representable, using zero");
            None
        }
    }
}

fn fresh_placeholder(rng: &mut impl Rng, taken: &mut HashSet<String>) -> ItemId {
    loop {
        let suffix: String = (0..PLACEHOLDER_SUFFIX_LEN)
            .map(|_| char::from(rng.sample(Alphanumeric)).to_ascii_lowercase())
            .collect();
        let id = ItemId::placeholder(&suffix);
        if taken.insert(id.as_str().to_owned()) {
            return id;
        }
    }
}
