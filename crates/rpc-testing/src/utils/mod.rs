pub mod assert;
pub mod io;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserializes a field that is present, even with a `null` value, as `Some`.
/// Combined with `#[serde(default)]`, an absent field stays `None`.
pub(crate) fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
