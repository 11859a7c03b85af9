//! Hydrating entity snapshots from response fragments

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use rabbitmon_core::prelude::*;

/// Metrics bag of an entity: every response key without a typed field
pub type Metrics = Map<String, Value>;

/// Decode one response fragment into a snapshot
pub(crate) fn decode<T: DeserializeOwned>(operation: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::decode(operation, e))
}

pub(crate) fn decode_object<T: DeserializeOwned>(
    operation: &str,
    object: Map<String, Value>,
) -> Result<T> {
    decode(operation, Value::Object(object))
}

/// Decode a listing, skipping elements whose `identity` field is missing
/// or empty (the default exchange, implicit default-exchange bindings).
pub(crate) fn decode_listing<T: DeserializeOwned>(
    operation: &str,
    identity: &str,
    items: Vec<Value>,
) -> Result<Vec<T>> {
    items
        .into_iter()
        .filter(|item| {
            let keep = has_identity(item, identity);
            if !keep {
                trace!("{}: skipping element without {}", operation, identity);
            }
            keep
        })
        .map(|item| decode(operation, item))
        .collect()
}

pub(crate) fn has_identity(item: &Value, identity: &str) -> bool {
    item.get(identity)
        .and_then(Value::as_str)
        .is_some_and(|value| !value.is_empty())
}

/// Renders a metrics bag as compact JSON
pub(crate) struct MetricsDisplay<'a>(pub &'a Metrics);

impl fmt::Display for MetricsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self.0).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// Ports are numbers for network connections and `"unknown"` (or absent)
/// for direct ones.
pub(crate) fn lenient_port<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|port| u16::try_from(port).ok()))
}

/// An object, or an empty map for anything else (the broker sends `[]`
/// for a message without properties).
pub(crate) fn object_or_empty<'de, D>(
    deserializer: D,
) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Ok(map),
        _ => Ok(Map::new()),
    }
}
