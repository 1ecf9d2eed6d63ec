//! Record-level decoding that skips malformed entries.
//!
//! Use with `#[serde(default, deserialize_with = "...")]` on collection
//! fields of persisted snapshots. A broken record is logged and dropped; the
//! rest of the document still loads.

use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::warn;

fn decode<T: DeserializeOwned>(value: Value, key: &dyn Display) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(record = %key, error = %err, "skipping malformed persisted record");
            None
        }
    }
}

/// Decodes a JSON array, dropping elements that fail to decode.
///
/// # Errors
///
/// Fails only when the field is not an array at all.
pub fn vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| decode(value, &position))
        .collect())
}

/// Decodes a JSON object into an ordered map, dropping entries whose key or
/// value fails to decode.
///
/// # Errors
///
/// Fails only when the field is not an object at all.
pub fn map<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: TryFrom<String> + Ord,
    K::Error: Display,
    V: DeserializeOwned,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(raw_key, value)| {
            let record = decode(value, &raw_key)?;
            match K::try_from(raw_key) {
                Ok(key) => Some((key, record)),
                Err(err) => {
                    warn!(error = %err, "skipping persisted record with invalid key");
                    None
                }
            }
        })
        .collect())
}
