use std::sync::Arc;

use crate::domain::{employee::Employee, schema::Schema};

/// Ordered Employee rows plus the schema they were loaded with.
/// Splitting shares the schema between the halves.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Arc<Schema>,
    rows: Vec<Employee>,
}

impl Dataset {
    pub fn new(schema: Arc<Schema>, rows: Vec<Employee>) -> Self {
        Self { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// A second dataset over the same schema.
    pub fn with_rows(&self, rows: Vec<Employee>) -> Self {
        Self { schema: Arc::clone(&self.schema), rows }
    }

    pub fn rows(&self) -> &[Employee] {
        &self.rows
    }

    pub fn into_parts(self) -> (Arc<Schema>, Vec<Employee>) {
        (self.schema, self.rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn labels(&self) -> Vec<bool> {
        self.rows.iter().map(Employee::attrition).collect()
    }

    /// Fraction of rows labelled as attrition; 0.0 for an empty set.
    pub fn positive_rate(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let positives = self.rows.iter().filter(|e| e.attrition()).count();
        positives as f64 / self.rows.len() as f64
    }
}
