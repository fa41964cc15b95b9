// ============================================================
// Layer 2 — Run Observer
// ============================================================
// Use cases report progress through this trait instead of
// printing. The CLI plugs in a console reporter; tests use
// Silent.

use crate::ml::{
    classifier::TrainedModel,
    evaluator::BinaryClassificationMetrics,
    importance::FeatureImportance,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PreparingData,
    PreparedData,
    Training,
    TrainedAndSaved,
    Evaluating,
}

impl Stage {
    pub fn banner(&self) -> &'static str {
        match self {
            Stage::PreparingData => "Preparing Data",
            Stage::PreparedData => "Prepared Data",
            Stage::Training => "Training model",
            Stage::TrainedAndSaved => "Trained and Saved the model",
            Stage::Evaluating => "Evaluating Model's accuracy with Test data",
        }
    }
}

pub trait RunObserver {
    fn stage(&self, stage: Stage);

    fn metrics(&self, model: &TrainedModel, metrics: &BinaryClassificationMetrics);

    /// Ranked importances, already cut to the requested top N.
    fn importance(&self, ranked: &[FeatureImportance]);
}

/// Observer that ignores everything.
pub struct Silent;

impl RunObserver for Silent {
    fn stage(&self, _stage: Stage) {}

    fn metrics(&self, _model: &TrainedModel, _metrics: &BinaryClassificationMetrics) {}

    fn importance(&self, _ranked: &[FeatureImportance]) {}
}
