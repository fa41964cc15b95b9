// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// All burn-specific code lives in model.rs and trainer.rs.
// Once fitted, both classifier kinds become plain serde data
// scored through the BinaryScorer trait, so evaluation and
// importance never touch a tensor.
//
//   model.rs      — LogisticNet (burn Linear → logit) and the
//                   extracted LogisticModel scorer
//
//   boosting.rs   — histogram gradient-boosted trees with
//                   logistic loss
//
//   trainer.rs    — fits pipeline + classifier; the burn
//                   DataLoader / Adam loop for logistic regression
//
//   classifier.rs — Classifier enum, TrainedModel, ModelManifest
//
//   evaluator.rs  — AUC, accuracy, precision/recall, F1, log-loss
//
//   importance.rs — permutation feature importance

/// Logistic regression network and fitted coefficients
pub mod model;

/// Gradient-boosted decision trees
pub mod boosting;

/// Training loop for both trainer kinds
pub mod trainer;

/// Trained model bundle and classifier dispatch
pub mod classifier;

/// Binary classification metrics
pub mod evaluator;

/// Permutation feature importance
pub mod importance;
