//! Turns the `raw_results` field of a reply into a columns/rows table.

use serde_json::{Map, Value};
use shared::domain::{NormalizedTable, SCALAR_COLUMN};

/// Builds a table from the raw result set.
///
/// The first element decides the shape: when it is a record its keys become
/// the columns and every element is kept as a row as-is; otherwise each
/// element is wrapped under a single `Result` column.
pub fn normalize(raw: Option<&Value>) -> NormalizedTable {
    let Some(Value::Array(items)) = raw else {
        return NormalizedTable::empty();
    };

    if let Some(Value::Object(first)) = items.first() {
        return NormalizedTable {
            columns: first.keys().cloned().collect(),
            rows: items.clone(),
        };
    }

    NormalizedTable {
        columns: vec![SCALAR_COLUMN.to_string()],
        rows: items.iter().cloned().map(wrap_scalar).collect(),
    }
}

fn wrap_scalar(value: Value) -> Value {
    let mut row = Map::with_capacity(1);
    row.insert(SCALAR_COLUMN.to_string(), value);
    Value::Object(row)
}

#[cfg(test)]
#[path = "tests/normalizer_tests.rs"]
mod tests;
