// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Reloads a saved model and scores a labelled CSV with it:
//
//   Step 1: Load the model zip     (Layer 6 - infra)
//   Step 2: Load the employee CSV  (Layer 4 - data)
//   Step 3: Evaluate every row     (Layer 5 - ml)
//   Step 4: Append to the run log  (Layer 6 - infra)

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::observer::{RunObserver, Stage};
use crate::data::loader::CsvLoader;
use crate::domain::traits::EmployeeSource;
use crate::infra::{metrics::MetricsLogger, model_store::ModelStore};
use crate::ml::{
    classifier::TrainedModel,
    evaluator::{evaluate, BinaryClassificationMetrics},
};

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub data_path:  PathBuf,
    pub model_path: PathBuf,
}

pub struct EvaluateOutcome {
    pub model:   TrainedModel,
    pub metrics: BinaryClassificationMetrics,
    pub rows:    usize,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self, observer: &dyn RunObserver) -> Result<EvaluateOutcome> {
        let cfg = &self.config;

        let store = ModelStore::new(&cfg.model_path);
        let model = store.load().with_context(|| {
            format!(
                "loading model from '{}'. Have you run 'train' first?",
                cfg.model_path.display()
            )
        })?;

        observer.stage(Stage::Evaluating);
        let data = CsvLoader::new(&cfg.data_path)
            .load_all()
            .with_context(|| format!("loading employees from '{}'", cfg.data_path.display()))?;
        let metrics = evaluate(&model, &data)?;

        MetricsLogger::new(store.dir())?.log_evaluation(&model.manifest().trainer, data.len(), &metrics)?;
        observer.metrics(&model, &metrics);

        Ok(EvaluateOutcome { model, metrics, rows: data.len() })
    }
}
