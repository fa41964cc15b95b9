// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores a dataset with a trained model and computes binary
// classification metrics at a 0.5 probability threshold.
//
//   AUC          rank-sum (Mann-Whitney) with mid-ranks for ties
//   AUPRC        step-wise average precision over distinct scores
//   log-loss     natural log, probabilities clamped to [1e-15, 1-1e-15]
//   LL reduction 1 - logloss / prior entropy of the evaluated labels
//
// Nothing here mutates the model, so evaluating twice gives
// bit-identical results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::dataset::Dataset;
use crate::error::{AttritionError, Result};
use crate::ml::classifier::TrainedModel;

const THRESHOLD: f32 = 0.5;
const EPSILON: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives:  usize,
    pub false_positives: usize,
    pub true_negatives:  usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryClassificationMetrics {
    pub auc:                f64,
    pub accuracy:           f64,
    pub positive_precision: f64,
    pub positive_recall:    f64,
    pub negative_precision: f64,
    pub negative_recall:    f64,
    pub f1_score:           f64,
    pub log_loss:           f64,
    pub log_loss_reduction: f64,
    pub auprc:              f64,
    pub confusion:          ConfusionMatrix,
}

/// Score `data` with `model` and compute metrics against its labels.
pub fn evaluate(model: &TrainedModel, data: &Dataset) -> Result<BinaryClassificationMetrics> {
    let scores = model.score_dataset(data)?;
    evaluate_scores(&scores, &data.labels())
}

pub fn evaluate_scores(scores: &[f32], labels: &[bool]) -> Result<BinaryClassificationMetrics> {
    if scores.len() != labels.len() {
        return Err(AttritionError::InvalidArgument(format!(
            "{} scores for {} labels",
            scores.len(),
            labels.len()
        )));
    }
    if scores.is_empty() {
        return Err(AttritionError::InvalidArgument("cannot evaluate an empty dataset".into()));
    }

    let mut confusion = ConfusionMatrix::default();
    for (&p, &y) in scores.iter().zip(labels) {
        match (p >= THRESHOLD, y) {
            (true, true) => confusion.true_positives += 1,
            (true, false) => confusion.false_positives += 1,
            (false, false) => confusion.true_negatives += 1,
            (false, true) => confusion.false_negatives += 1,
        }
    }
    let c = &confusion;
    let positive_precision = ratio(c.true_positives, c.true_positives + c.false_positives);
    let positive_recall = ratio(c.true_positives, c.true_positives + c.false_negatives);

    let n = labels.len() as f64;
    let log_loss = scores
        .iter()
        .zip(labels)
        .map(|(&p, &y)| {
            let p = (p as f64).clamp(EPSILON, 1.0 - EPSILON);
            if y { -p.ln() } else { -(1.0 - p).ln() }
        })
        .sum::<f64>()
        / n;
    let prior = labels.iter().filter(|&&y| y).count() as f64 / n;
    let prior_entropy = entropy(prior);
    let log_loss_reduction = if prior_entropy > 0.0 { 1.0 - log_loss / prior_entropy } else { f64::NAN };

    Ok(BinaryClassificationMetrics {
        auc: auc(scores, labels),
        accuracy: ratio(c.true_positives + c.true_negatives, c.total()),
        positive_precision,
        positive_recall,
        negative_precision: ratio(c.true_negatives, c.true_negatives + c.false_negatives),
        negative_recall: ratio(c.true_negatives, c.true_negatives + c.false_positives),
        f1_score: if positive_precision + positive_recall > 0.0 {
            2.0 * positive_precision * positive_recall / (positive_precision + positive_recall)
        } else {
            0.0
        },
        log_loss,
        log_loss_reduction,
        auprc: auprc(scores, labels),
        confusion,
    })
}

/// Area under the ROC curve. NaN when only one class is present.
pub fn auc(scores: &[f32], labels: &[bool]) -> f64 {
    let positives = labels.iter().filter(|&&y| y).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return f64::NAN;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // mid-ranks, 1-based
    let mut rank_sum = 0.0f64;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]].total_cmp(&scores[order[i]]) == Ordering::Equal {
            j += 1;
        }
        let mid_rank = (i + j) as f64 / 2.0 + 1.0;
        rank_sum += order[i..=j].iter().filter(|&&k| labels[k]).count() as f64 * mid_rank;
        i = j + 1;
    }

    let p = positives as f64;
    (rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64)
}

/// Area under the precision-recall curve as average precision.
/// Tied scores are taken as one threshold. NaN without positives.
pub fn auprc(scores: &[f32], labels: &[bool]) -> f64 {
    let positives = labels.iter().filter(|&&y| y).count();
    if positives == 0 {
        return f64::NAN;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let (mut tp, mut fp, mut area, mut last_recall) = (0usize, 0usize, 0.0f64, 0.0f64);
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j < order.len() && scores[order[j]].total_cmp(&scores[order[i]]) == Ordering::Equal {
            if labels[order[j]] { tp += 1 } else { fp += 1 }
            j += 1;
        }
        let recall = tp as f64 / positives as f64;
        let precision = tp as f64 / (tp + fp) as f64;
        area += (recall - last_recall) * precision;
        last_recall = recall;
        i = j;
    }
    area
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn entropy(p: f64) -> f64 {
    if p <= 0.0 || p >= 1.0 {
        0.0
    } else {
        -(p * p.ln() + (1.0 - p) * (1.0 - p).ln())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_ranking_has_unit_auc() {
        let scores = [0.1, 0.2, 0.8, 0.9];
        let labels = [false, false, true, true];
        assert_eq!(auc(&scores, &labels), 1.0);
        assert_eq!(auprc(&scores, &labels), 1.0);
    }

    #[test]
    fn reversed_ranking_has_zero_auc() {
        assert_eq!(auc(&[0.9, 0.1], &[false, true]), 0.0);
    }

    #[test]
    fn ties_take_mid_ranks() {
        // every score equal: AUC is exactly one half
        assert_eq!(auc(&[0.5; 4], &[true, false, true, false]), 0.5);
    }

    #[test]
    fn single_class_auc_is_nan() {
        assert!(auc(&[0.3, 0.7], &[true, true]).is_nan());
        let m = evaluate_scores(&[0.3, 0.7], &[false, false]).unwrap();
        assert!(m.auc.is_nan());
        assert!(m.auprc.is_nan());
    }

    #[test]
    fn nan_score_still_terminates() {
        let m = evaluate_scores(&[f32::NAN, 0.9, 0.1], &[true, true, false]).unwrap();
        assert_eq!(m.confusion.true_positives + m.confusion.false_negatives, 2);
        assert!(auprc(&[f32::NAN, f32::NAN, 0.2], &[true, false, true]) >= 0.0);
    }

    #[test]
    fn confusion_and_derived_rates() {
        let scores = [0.9, 0.6, 0.4, 0.2, 0.7];
        let labels = [true, false, true, false, true];
        let m = evaluate_scores(&scores, &labels).unwrap();

        assert_eq!(
            m.confusion,
            ConfusionMatrix { true_positives: 2, false_positives: 1, true_negatives: 1, false_negatives: 1 }
        );
        assert_eq!(m.accuracy, 0.6);
        assert!((m.positive_precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.positive_recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.negative_precision, 0.5);
        assert_eq!(m.negative_recall, 0.5);
        assert!((m.f1_score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn log_loss_of_constant_prior_prediction_has_zero_reduction() {
        let labels = [true, false, false, false];
        let m = evaluate_scores(&[0.25; 4], &labels).unwrap();
        assert!((m.log_loss - entropy(0.25)).abs() < 1e-7);
        assert!(m.log_loss_reduction.abs() < 1e-6);
    }

    #[test]
    fn log_loss_clamps_certain_mistakes() {
        let m = evaluate_scores(&[0.0, 1.0], &[true, false]).unwrap();
        assert!(m.log_loss.is_finite());
        assert!(m.log_loss > 30.0);
    }

    #[test]
    fn evaluation_is_bit_identical_across_calls() {
        let scores = [0.11, 0.52, 0.33, 0.91, 0.47, 0.52];
        let labels = [false, true, false, true, true, false];
        let a = evaluate_scores(&scores, &labels).unwrap();
        let b = evaluate_scores(&scores, &labels).unwrap();
        assert_eq!(a.auc.to_bits(), b.auc.to_bits());
        assert_eq!(a.log_loss.to_bits(), b.log_loss.to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_length_mismatch_and_empty_input() {
        assert!(evaluate_scores(&[0.5], &[true, false]).is_err());
        assert!(evaluate_scores(&[], &[]).is_err());
    }
}
