// ============================================================
// Layer 5 — Permutation Feature Importance
// ============================================================
// For each slot j of the feature vector, `count` times:
//   shuffle column j across rows, rescore, recompute AUC,
//   record  baseline_auc - permuted_auc
//
// A large positive mean means the model leans on that slot.
// Results are keyed by slot index, and the name comes from the
// same matrix, so a name always describes the column that was
// actually permuted.

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::data::pipeline::FeatureMatrix;
use crate::domain::traits::BinaryScorer;
use crate::error::{AttritionError, Result};
use crate::ml::evaluator::auc;

/// z for a two-sided 95% normal interval
pub const Z_95: f64 = 1.96;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStatistics {
    pub mean: f64,
    /// Sample standard deviation (n - 1); 0 for a single sample
    pub standard_deviation: f64,
    pub standard_error: f64,
    pub count: usize,
}

impl MetricStatistics {
    pub fn from_samples(samples: &[f64]) -> Result<Self> {
        if samples.is_empty() {
            return Err(AttritionError::InvalidArgument("no samples to summarise".into()));
        }
        let count = samples.len();
        let n = count as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let standard_deviation = if count > 1 {
            (samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Ok(Self {
            mean,
            standard_deviation,
            standard_error: standard_deviation / n.sqrt(),
            count,
        })
    }

    /// Half-width of the 95% confidence interval of the mean.
    pub fn confidence_95(&self) -> f64 {
        Z_95 * self.standard_error
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub slot: usize,
    pub name: String,
    /// Coefficient (logistic) or total split gain (trees)
    pub weight: Option<f32>,
    pub auc_delta: MetricStatistics,
}

pub fn permutation_importance<R: Rng + ?Sized>(
    scorer: &dyn BinaryScorer,
    data:   &FeatureMatrix,
    count:  usize,
    rng:    &mut R,
) -> Result<Vec<FeatureImportance>> {
    if count == 0 {
        return Err(AttritionError::InvalidArgument(
            "permutation count must be at least 1".into(),
        ));
    }
    if data.width() != scorer.num_features() {
        return Err(AttritionError::InvalidArgument(format!(
            "matrix has {} features, model expects {}",
            data.width(),
            scorer.num_features()
        )));
    }

    let baseline = auc(&scorer.score_rows(data.values()), data.labels());
    if baseline.is_nan() {
        return Err(AttritionError::InvalidArgument(
            "permutation importance needs both classes in the data".into(),
        ));
    }
    tracing::debug!("Permutation baseline AUC {:.4} over {} rows", baseline, data.len());

    let weights = scorer.feature_weights();
    let mut scratch = data.clone();
    let mut results = Vec::with_capacity(data.width());

    for slot in 0..data.width() {
        let original = data.column(slot);
        let mut shuffled = original.clone();
        let mut deltas = Vec::with_capacity(count);

        for _ in 0..count {
            shuffled.shuffle(rng);
            scratch.set_column(slot, &shuffled);
            let permuted = auc(&scorer.score_rows(scratch.values()), data.labels());
            deltas.push(baseline - permuted);
        }
        scratch.set_column(slot, &original);

        results.push(FeatureImportance {
            slot,
            name: data.slot_names()[slot].clone(),
            weight: weights.as_ref().and_then(|w| w.get(slot).copied()),
            auc_delta: MetricStatistics::from_samples(&deltas)?,
        });
    }

    Ok(results)
}

/// Sort by the magnitude of the mean AUC change, largest first.
pub fn rank_by_impact(mut importances: Vec<FeatureImportance>) -> Vec<FeatureImportance> {
    importances.sort_by(|a, b| b.auc_delta.mean.abs().total_cmp(&a.auc_delta.mean.abs()));
    importances
}
