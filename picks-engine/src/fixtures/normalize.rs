//! Raw feed JSON -> [`FixtureRecord`]s.
//!
//! Only the top-level shape can fail here. A record that does not
//! deserialize becomes an empty record, which the selector then counts as
//! malformed and skips. Bad bookmakers, bets and values inside an otherwise
//! valid record are dropped one by one and the record is kept.

use super::types::FixtureRecord;
use crate::error::SelectError;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Accepts a bare array of records or the `{"response": [...]}` envelope.
pub fn records_from_value(value: &Value) -> Result<Vec<FixtureRecord>, SelectError> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("response") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(SelectError::InvalidInput(format!(
                    "`response` is {}, expected an array",
                    kind(other)
                )))
            }
            None => {
                return Err(SelectError::InvalidInput(
                    "object has no `response` array".to_string(),
                ))
            }
        },
        other => {
            return Err(SelectError::InvalidInput(format!(
                "expected an array of records, got {}",
                kind(other)
            )))
        }
    };

    Ok(items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            FixtureRecord::deserialize(item).unwrap_or_else(|e| {
                debug!("Record {} is malformed: {}", i, e);
                FixtureRecord::default()
            })
        })
        .collect())
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
