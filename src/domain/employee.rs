// ============================================================
// Layer 3 — Employee Record
// ============================================================
// One row of HR data. Values are stored per role, in the
// order the schema lists them, so a record is only meaningful
// together with the Schema it was loaded against.
//
// Fields are private: a record is immutable once the loader
// has built it.

use serde::{Deserialize, Serialize};

use crate::domain::schema::Schema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// 0-based index of the data row in the source file
    row_id: usize,
    numeric: Vec<f32>,
    categorical: Vec<String>,
    attrition: bool,
}

impl Employee {
    pub fn new(row_id: usize, numeric: Vec<f32>, categorical: Vec<String>, attrition: bool) -> Self {
        Self { row_id, numeric, categorical, attrition }
    }

    pub fn row_id(&self) -> usize {
        self.row_id
    }

    pub fn numeric(&self) -> &[f32] {
        &self.numeric
    }

    pub fn categorical(&self) -> &[String] {
        &self.categorical
    }

    pub fn attrition(&self) -> bool {
        self.attrition
    }

    pub fn numeric_value(&self, schema: &Schema, name: &str) -> Option<f32> {
        schema
            .numeric_index(name)
            .and_then(|i| self.numeric.get(i).copied())
    }

    pub fn categorical_value(&self, schema: &Schema, name: &str) -> Option<&str> {
        schema
            .categorical_index(name)
            .and_then(|i| self.categorical.get(i))
            .map(String::as_str)
    }
}

/// Parse an attrition label cell. Accepts Yes/No, True/False and 1/0
/// in any case; anything else is not a label.
pub fn parse_label(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Some(true),
        "no" | "false" | "0" => Some(false),
        _ => None,
    }
}
