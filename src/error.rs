// ============================================================
// Error Taxonomy
// ============================================================
// Library-level failures. Every variant is fatal for a run:
// the application layer wraps these in anyhow with context
// and main() exits non-zero. Nothing here is retried.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttritionError {
    /// The input CSV (or a saved model) does not exist
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Column name, column count or cell type does not match the schema
    #[error("Schema mismatch{}: {message}", row.map(|r| format!(" at row {r}")).unwrap_or_default())]
    SchemaMismatch {
        row: Option<usize>,
        message: String,
    },

    /// Degenerate training input or a diverging optimiser
    #[error("Training failed: {0}")]
    TrainingFailure(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A saved model archive is missing an entry or holds bad JSON
    #[error("Model format error: {0}")]
    ModelFormat(String),
}

impl AttritionError {
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaMismatch { row: None, message: message.into() }
    }

    pub fn schema_at(row: usize, message: impl Into<String>) -> Self {
        Self::SchemaMismatch { row: Some(row), message: message.into() }
    }

    /// Map an io::Error on `path`, turning NotFound into FileNotFound.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}

pub type Result<T> = std::result::Result<T, AttritionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_file_not_found() {
        let err = AttritionError::io(
            "data/missing.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, AttritionError::FileNotFound { .. }));
    }

    #[test]
    fn schema_message_includes_row() {
        let err = AttritionError::schema_at(7, "bad Age");
        assert_eq!(err.to_string(), "Schema mismatch at row 7: bad Age");
        let err = AttritionError::schema("no rows");
        assert_eq!(err.to_string(), "Schema mismatch: no rows");
    }
}
