// ============================================================
// Layer 4 — CSV Loader
// ============================================================
// Reads a delimited text file into a Dataset of Employee rows
// using the csv crate, typed through an explicit Schema.
//
// Binding columns:
//   With a header row, schema columns are found by NAME (order
//   does not matter). Without one, they are bound by POSITION in
//   schema order.
//
// Every cell is checked against its declared role:
//   Numeric     → must parse as a finite f32
//   Categorical → any string
//   Label       → Yes/No, True/False or 1/0
//   Ignored     → not read
//
// Any mismatch aborts the load with SchemaMismatch.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::domain::{
    dataset::Dataset,
    employee::{parse_label, Employee},
    schema::{ColumnKind, Schema},
    traits::EmployeeSource,
};
use crate::error::{AttritionError, Result};

/// Loads Employee rows from a delimited text file.
/// Implements the EmployeeSource trait from Layer 3.
pub struct CsvLoader {
    path: PathBuf,
    delimiter: u8,
    has_header: bool,
    schema: Arc<Schema>,
}

impl CsvLoader {
    /// Comma-delimited, header row expected, IBM HR employee schema.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
            has_header: true,
            schema: Arc::new(Schema::employee()),
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    /// Parse rows from any reader. `load_all` feeds it the file.
    pub fn read_from<R: Read>(&self, reader: R) -> Result<Dataset> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_header)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        // ── Bind schema columns to file columns ───────────────────────────────
        let (bindings, expected_len) = if self.has_header {
            let headers = rdr
                .headers()
                .map_err(|e| csv_error(&self.path, None, e))?
                .clone();
            let names: Vec<&str> = headers
                .iter()
                .map(|h| h.trim_start_matches('\u{feff}').trim())
                .collect();
            (self.bind_by_name(&names)?, names.len())
        } else {
            let n = self.schema.columns().len();
            ((0..n).map(Some).collect(), n)
        };

        // ── Parse every data row ──────────────────────────────────────────────
        let mut rows = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| csv_error(&self.path, Some(row), e))?;

            if record.len() != expected_len {
                return Err(AttritionError::schema_at(
                    row,
                    format!("expected {expected_len} columns, found {}", record.len()),
                ));
            }

            rows.push(self.parse_row(row, &record, &bindings)?);
        }

        if rows.is_empty() {
            return Err(AttritionError::schema(format!(
                "'{}' contains no data rows",
                self.path.display()
            )));
        }

        Ok(Dataset::new(Arc::clone(&self.schema), rows))
    }

    /// For each schema column, the index of the matching header.
    /// Ignored columns may be absent; every other column must be present.
    fn bind_by_name(&self, headers: &[&str]) -> Result<Vec<Option<usize>>> {
        let mut bindings = Vec::with_capacity(self.schema.columns().len());
        for col in self.schema.columns() {
            let index = headers.iter().position(|h| *h == col.name);
            if index.is_none() && col.kind != ColumnKind::Ignored {
                return Err(AttritionError::schema(format!(
                    "missing column '{}' in header",
                    col.name
                )));
            }
            bindings.push(index);
        }

        for h in headers {
            if self.schema.column(h).is_none() {
                tracing::debug!("Ignoring unknown column '{}'", h);
            }
        }

        Ok(bindings)
    }

    fn parse_row(
        &self,
        row: usize,
        record: &csv::StringRecord,
        bindings: &[Option<usize>],
    ) -> Result<Employee> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();
        let mut label = None;

        for (col, binding) in self.schema.columns().iter().zip(bindings) {
            let Some(index) = binding else { continue };
            let cell = record.get(*index).unwrap_or_default();

            match col.kind {
                ColumnKind::Numeric => {
                    let value = cell
                        .parse::<f32>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .ok_or_else(|| {
                            AttritionError::schema_at(
                                row,
                                format!("column '{}': '{}' is not a finite number", col.name, cell),
                            )
                        })?;
                    numeric.push(value);
                }
                ColumnKind::Categorical => categorical.push(cell.to_string()),
                ColumnKind::Label => {
                    label = Some(parse_label(cell).ok_or_else(|| {
                        AttritionError::schema_at(
                            row,
                            format!("column '{}': '{}' is not a yes/no label", col.name, cell),
                        )
                    })?);
                }
                ColumnKind::Ignored => {}
            }
        }

        let label = label.ok_or_else(|| AttritionError::schema_at(row, "label column not bound"))?;
        Ok(Employee::new(row, numeric, categorical, label))
    }
}

impl EmployeeSource for CsvLoader {
    fn load_all(&self) -> Result<Dataset> {
        let file = File::open(&self.path).map_err(|e| AttritionError::io(&self.path, e))?;
        let dataset = self.read_from(BufReader::new(file))?;

        tracing::info!(
            "Loaded {} rows from '{}' ({:.1}% attrition)",
            dataset.len(),
            self.path.display(),
            dataset.positive_rate() * 100.0
        );
        Ok(dataset)
    }
}

fn csv_error(path: &Path, row: Option<usize>, err: csv::Error) -> AttritionError {
    match err.into_kind() {
        csv::ErrorKind::Io(source) => AttritionError::io(path, source),
        other => AttritionError::SchemaMismatch {
            row,
            message: format!("malformed CSV: {other:?}"),
        },
    }
}
