//! Tolerant field deserializers for node config records.
//!
//! Config blobs come straight from the editor and may carry values of the
//! wrong JSON type. A mistyped field reads as absent instead of failing the
//! whole workflow, so the validators can still report on it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A JSON string, or `None` for anything else.
pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// A JSON number, or `None` for anything else.
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        _ => None,
    })
}

/// Any value `T` accepts; anything it rejects reads as `None`.
pub fn value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).ok())
}

/// Typed view of a raw node config. `null`, non-objects and unreadable
/// objects fall back to the empty config.
pub fn view<C>(raw: &Value) -> C
where
    C: DeserializeOwned + Default,
{
    if !raw.is_object() {
        return C::default();
    }
    C::deserialize(raw).unwrap_or_default()
}

/// Label text; non-strings read as empty.
pub fn label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string(deserializer)?.unwrap_or_default())
}

/// `Some` only for strings with non-whitespace content.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
