use serde_json::Value;

use crate::models::{error::RunnerError, FixtureMap};

/// Fails with the expected and actual entities when they differ. The keys that
/// differ are listed in the error context.
pub fn assert_fields_eq(
    context: &str,
    expected: FixtureMap,
    actual: FixtureMap,
) -> Result<(), RunnerError> {
    if expected == actual {
        return Ok(());
    }

    let mut differing: Vec<&str> = expected
        .iter()
        .filter(|(key, value)| actual.get(key.as_str()) != Some(*value))
        .map(|(key, _)| key.as_str())
        .chain(
            actual
                .keys()
                .filter(|key| !expected.contains_key(key.as_str()))
                .map(String::as_str),
        )
        .collect();
    differing.sort_unstable();

    let context = format!("{context} (differing fields: {})", differing.join(", "));
    Err(RunnerError::mismatch(
        context,
        Value::Object(expected),
        Value::Object(actual),
    ))
}

/// Returns the RPC value as an object, failing when it is anything else
/// (typically `null` for an unknown block).
pub fn expect_object<'a>(context: &str, value: &'a Value) -> Result<&'a FixtureMap, RunnerError> {
    value.as_object().ok_or_else(|| {
        RunnerError::mismatch(
            format!("{context}: expected an object"),
            Value::String("object".to_string()),
            value.clone(),
        )
    })
}
