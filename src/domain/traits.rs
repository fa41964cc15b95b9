// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these instead of the
// concrete CSV loader or a concrete classifier.

use crate::domain::dataset::Dataset;
use crate::error::Result;

// ─── EmployeeSource ───────────────────────────────────────────────────────────
/// Anything that can produce a Dataset of Employee rows.
///
/// Implementations:
///   - CsvLoader → delimited text file with a fixed schema
pub trait EmployeeSource {
    fn load_all(&self) -> Result<Dataset>;
}

// ─── BinaryScorer ─────────────────────────────────────────────────────────────
/// A fitted binary classifier over dense feature vectors.
///
/// Implementations:
///   - LogisticModel  → sigmoid(w·x + b)
///   - BoostedTrees   → sigmoid(bias + Σ tree(x))
///   - Classifier     → dispatches to either
pub trait BinaryScorer {
    /// Probability of the positive (attrition) class.
    fn score(&self, features: &[f32]) -> f32;

    /// Number of feature slots the scorer expects.
    fn num_features(&self) -> usize;

    /// Per-slot weight (coefficient or split gain), when the model has one.
    fn feature_weights(&self) -> Option<Vec<f32>> {
        None
    }

    /// Score every row of a row-major matrix with `num_features()` columns.
    fn score_rows(&self, values: &[f32]) -> Vec<f32> {
        let width = self.num_features().max(1);
        values.chunks(width).map(|row| self.score(row)).collect()
    }
}
