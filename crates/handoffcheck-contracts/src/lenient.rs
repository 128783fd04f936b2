//! Tolerant deserialization for cosmetic fields
//!
//! A cosmetic field with the wrong JSON type falls back to its default instead
//! of failing the whole payload. The validators report such values at the
//! field's own severity.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Use with `#[serde(default, deserialize_with = "crate::lenient::or_default")]`
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}
