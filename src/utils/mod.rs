//! Project-specific utilities live here.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// Formats a shared log prefix for project logs.
pub fn log_prefix(module: &str) -> String {
    format!("books::{module}")
}

/// Treats an empty string as "not supplied".
///
/// Partial updates never clear a text column: an empty value in a patch is
/// indistinguishable from an absent one.
pub fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Treats zero as "not supplied".
pub fn supplied_number(value: Option<i32>) -> Option<i32> {
    value.filter(|v| *v != 0)
}

/// Reads an optional RFC 3339 timestamp where `""` and `null` mean absent.
///
/// Use with `#[serde(deserialize_with = "...")]`; missing fields still fall
/// back to the container default.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<DateTime<Utc>>().map(Some).map_err(de::Error::custom),
    }
}

/// Renders ids the way batch-delete messages list them: `[1 2 3]`.
pub fn format_ids(ids: &[i32]) -> String {
    let joined = ids
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    format!("[{joined}]")
}
