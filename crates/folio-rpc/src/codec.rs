//! Wire codec for richly-typed payloads.
//!
//! JSON alone cannot say that `"2024-01-01T00:00:00Z"` used to be a
//! datetime. [`Payload`] keeps the plain JSON projection in `json` and
//! records the lost types in a `meta` sidecar keyed by value path, so
//! untyped consumers (the hydration script, debugging tools) can recover
//! them. Typed consumers deserialize straight from `json`; the sidecar is
//! never required for a correct round trip because serde re-parses tagged
//! strings into their native types.
//!
//! Maps and sets ride their canonical JSON projections (sorted-key objects
//! and arrays) and round-trip by declared type on each side.

use std::collections::BTreeMap;

use chrono::DateTime;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Type tag for a JSON leaf whose native type the projection lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Datetime,
}

/// Codec failures.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON conversion failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A value in transit: plain JSON plus the type-tag sidecar.
///
/// `meta` keys are slash-separated value paths (`""` for the root,
/// `"/0/created_at"` for a field of the first array element).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub json: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, TypeTag>,
}

impl Payload {
    /// The empty payload, used for procedures without input.
    pub fn null() -> Self {
        Self::default()
    }

    /// Serialize a typed value and tag the leaves that need it.
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, CodecError> {
        let json = serde_json::to_value(value)?;
        let mut meta = BTreeMap::new();
        tag_leaves(&json, String::new(), &mut meta);
        Ok(Self { json, meta })
    }

    /// Deserialize the JSON projection into a typed value.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        Ok(serde_json::from_value(self.json.clone())?)
    }
}

/// Walk the JSON tree and tag string leaves that parse as RFC 3339
/// datetimes. The tree itself is never rewritten.
fn tag_leaves(value: &Value, path: String, meta: &mut BTreeMap<String, TypeTag>) {
    match value {
        Value::String(s) => {
            if DateTime::parse_from_rfc3339(s).is_ok() {
                meta.insert(path, TypeTag::Datetime);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                tag_leaves(item, format!("{path}/{i}"), meta);
            }
        }
        Value::Object(fields) => {
            for (key, item) in fields {
                tag_leaves(item, format!("{path}/{key}"), meta);
            }
        }
        _ => {}
    }
}
