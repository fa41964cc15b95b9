// ============================================================
// Layer 3 — Column Schema
// ============================================================
// An ordered list of (column name, semantic role). The loader
// binds CSV headers against it, the feature pipeline resolves
// column names through it.
//
// Roles:
//   Numeric     → parsed as f32, usable as a raw feature
//   Categorical → kept as a string, must be encoded before use
//   Label       → the boolean target (exactly one per schema)
//   Ignored     → present in the file, never a feature

use serde::{Deserialize, Serialize};

use crate::error::{AttritionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Label,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self { name: name.into(), kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// Build a schema, rejecting duplicate names and anything
    /// other than exactly one label column.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        let labels = columns.iter().filter(|c| c.kind == ColumnKind::Label).count();
        if labels != 1 {
            return Err(AttritionError::schema(format!(
                "schema must declare exactly one label column, found {labels}"
            )));
        }
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(AttritionError::schema(format!(
                    "duplicate column '{}'",
                    col.name
                )));
            }
        }
        Ok(Self { columns })
    }

    /// The fixed IBM HR attrition layout, in source file order.
    pub fn employee() -> Self {
        use ColumnKind::*;
        let columns = [
            ("Age", Numeric),
            ("Attrition", Label),
            ("BusinessTravel", Categorical),
            ("DailyRate", Numeric),
            ("Department", Categorical),
            ("DistanceFromHome", Numeric),
            ("Education", Numeric),
            ("EducationField", Categorical),
            ("EmployeeCount", Ignored),
            ("EmployeeNumber", Ignored),
            ("EnvironmentSatisfaction", Numeric),
            ("Gender", Ignored),
            ("HourlyRate", Numeric),
            ("JobInvolvement", Numeric),
            ("JobLevel", Categorical),
            ("JobRole", Categorical),
            ("JobSatisfaction", Numeric),
            ("MaritalStatus", Categorical),
            ("MonthlyIncome", Numeric),
            ("MonthlyRate", Numeric),
            ("NumCompaniesWorked", Numeric),
            ("Over18", Ignored),
            ("OverTime", Categorical),
            ("PercentSalaryHike", Numeric),
            ("PerformanceRating", Numeric),
            ("RelationshipSatisfaction", Numeric),
            ("StandardHours", Ignored),
            ("StockOptionLevel", Numeric),
            ("TotalWorkingYears", Numeric),
            ("TrainingTimesLastYear", Numeric),
            ("WorkLifeBalance", Numeric),
            ("YearsAtCompany", Numeric),
            ("YearsInCurrentRole", Numeric),
            ("YearsSinceLastPromotion", Numeric),
            ("YearsWithCurrManager", Numeric),
        ];
        Self {
            columns: columns
                .into_iter()
                .map(|(name, kind)| ColumnSpec::new(name, kind))
                .collect(),
        }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn label_name(&self) -> &str {
        self.columns
            .iter()
            .find(|c| c.kind == ColumnKind::Label)
            .map(|c| c.name.as_str())
            .unwrap_or_default()
    }

    /// Names of all columns with the given role, in schema order.
    pub fn names_of(&self, kind: ColumnKind) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Position of `name` among the numeric columns.
    pub fn numeric_index(&self, name: &str) -> Option<usize> {
        self.index_within(ColumnKind::Numeric, name)
    }

    /// Position of `name` among the categorical columns.
    pub fn categorical_index(&self, name: &str) -> Option<usize> {
        self.index_within(ColumnKind::Categorical, name)
    }

    fn index_within(&self, kind: ColumnKind, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .position(|c| c.name == name)
    }
}
