use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Column header used when the result set is a list of bare values.
pub const SCALAR_COLUMN: &str = "Result";

/// A trimmed, non-empty natural-language question.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Question(String);

impl Question {
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyQuestion);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Question {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Uniform columns/rows view over a heterogeneous result set.
///
/// Rows are kept as raw JSON values: when the result set is a list of
/// records, rows after the first are not checked against the first row's
/// keys, so a row may lack a column or carry extra fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Value>,
}

impl NormalizedTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Looks up `column` in `row`; `None` when the row is not a record or
    /// does not carry the field.
    pub fn cell<'a>(row: &'a Value, column: &str) -> Option<&'a Value> {
        row.as_object().and_then(|fields| fields.get(column))
    }
}
