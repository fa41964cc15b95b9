// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the employee CSV        (Layer 4 - data)
//   Step 2: Split train/test             (Layer 4 - data)
//   Step 3: Build the feature pipeline   (Layer 4 - data)
//   Step 4: Fit pipeline on train rows   (Layer 4 - data)
//   Step 5: Fit the classifier           (Layer 5 - ml)
//   Step 6: Save model + config          (Layer 6 - infra)
//   Step 7: Log training history         (Layer 6 - infra)
//   Step 8: Evaluate on test rows        (Layer 5 - ml)
//   Step 9: Permutation importance       (Layer 5 - ml)
//
// Importance is measured on the encoded TRAINING rows.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::observer::{RunObserver, Stage};
use crate::data::{
    loader::CsvLoader,
    pipeline::{CategoricalEncoding, PipelineSpec},
    splitter::split_train_test,
};
use crate::domain::traits::{BinaryScorer, EmployeeSource};
use crate::error::AttritionError;
use crate::infra::{
    metrics::{EpochMetrics, MetricsLogger},
    model_store::ModelStore,
    session::{Session, PERMUTATION_STREAM, SPLIT_STREAM},
};
use crate::ml::{
    classifier::TrainedModel,
    evaluator::{evaluate, BinaryClassificationMetrics},
    importance::{permutation_importance, rank_by_impact, FeatureImportance},
    trainer::{LogisticConfig, Trainer, TrainerKind},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Serialisable so it is stored inside the model zip and a run
// can be repeated from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:         PathBuf,
    pub model_path:        PathBuf,
    pub test_fraction:     f64,
    pub seed:              Option<u64>,
    pub trainer:           TrainerKind,
    pub encoding:          CategoricalEncoding,
    pub permutation_count: usize,
    pub top_features:      usize,
    pub importance:        bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:         PathBuf::from("./data/attrition.csv"),
            model_path:        PathBuf::from("./model/attritionModel.zip"),
            test_fraction:     0.2,
            seed:              None,
            trainer:           TrainerKind::LogisticRegression(LogisticConfig::default()),
            encoding:          CategoricalEncoding::Index,
            permutation_count: 50,
            top_features:      10,
            importance:        true,
        }
    }
}

pub struct TrainOutcome {
    pub model:       TrainedModel,
    pub history:     Vec<EpochMetrics>,
    pub metrics:     BinaryClassificationMetrics,
    /// Ranked by impact, all slots
    pub importance:  Vec<FeatureImportance>,
    pub train_rows:  usize,
    pub test_rows:   usize,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self, observer: &dyn RunObserver) -> Result<TrainOutcome> {
        let cfg = &self.config;
        let session = Session::new(cfg.seed);

        // ── Step 1: Load the CSV ──────────────────────────────────────────────
        observer.stage(Stage::PreparingData);
        let data = CsvLoader::new(&cfg.data_path)
            .load_all()
            .with_context(|| format!("loading employees from '{}'", cfg.data_path.display()))?;

        // ── Step 2: Train / test split ────────────────────────────────────────
        let split_seed = session.seed().map(|_| session.stream_seed(SPLIT_STREAM));
        let (train, test) = split_train_test(data, cfg.test_fraction, split_seed)?;
        tracing::info!("Split: {} train, {} test", train.len(), test.len());
        if train.is_empty() {
            return Err(AttritionError::TrainingFailure(format!(
                "training split is empty: all {} rows were held out for testing",
                test.len()
            ))
            .into());
        }

        // ── Steps 3-4: Fit the feature pipeline on train rows ─────────────────
        let spec = PipelineSpec::attrition(
            train.schema(),
            cfg.encoding,
            cfg.trainer.wants_normalized_features(),
        );
        let pipeline = spec.fit(&train).context("fitting the feature pipeline")?;
        let features = pipeline.transform(&train)?;
        tracing::info!(
            "Encoded {} training rows into {} features",
            features.len(),
            features.width()
        );
        observer.stage(Stage::PreparedData);

        // ── Step 5: Fit the classifier ────────────────────────────────────────
        observer.stage(Stage::Training);
        let trainer = Trainer::new(&session, cfg.trainer.clone());
        let outcome = trainer
            .fit_features(pipeline, &features)
            .with_context(|| format!("training the {} classifier", cfg.trainer.name()))?;

        // ── Steps 6-7: Save model, config and history ─────────────────────────
        let store = ModelStore::new(&cfg.model_path);
        store
            .save(&outcome.model, cfg)
            .with_context(|| format!("saving model to '{}'", cfg.model_path.display()))?;
        let logger = MetricsLogger::new(store.dir())?;
        logger.log_history(cfg.trainer.name(), &outcome.history)?;
        observer.stage(Stage::TrainedAndSaved);

        // ── Step 8: Evaluate on the held-out rows ─────────────────────────────
        observer.stage(Stage::Evaluating);
        let metrics = evaluate(&outcome.model, &test).context("evaluating on the test split")?;
        logger.log_evaluation(cfg.trainer.name(), test.len(), &metrics)?;
        tracing::info!("Test AUC {:.4}, accuracy {:.4}", metrics.auc, metrics.accuracy);
        observer.metrics(&outcome.model, &metrics);

        // ── Step 9: Permutation feature importance ────────────────────────────
        let importance = if cfg.importance {
            let mut rng = session.rng(PERMUTATION_STREAM);
            let scorer: &dyn BinaryScorer = outcome.model.classifier();
            let ranked = rank_by_impact(permutation_importance(
                scorer,
                &features,
                cfg.permutation_count,
                &mut rng,
            )?);
            observer.importance(&ranked[..cfg.top_features.min(ranked.len())]);
            ranked
        } else {
            Vec::new()
        };

        Ok(TrainOutcome {
            model: outcome.model,
            history: outcome.history,
            metrics,
            importance,
            train_rows: train.len(),
            test_rows: test.len(),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::observer::Silent;
    use crate::ml::boosting::BoostConfig;
    use crate::test_support::write_employee_csv;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        stages: RefCell<Vec<Stage>>,
        shown: RefCell<usize>,
    }

    impl RunObserver for Recorder {
        fn stage(&self, stage: Stage) {
            self.stages.borrow_mut().push(stage);
        }

        fn metrics(&self, _model: &TrainedModel, _metrics: &BinaryClassificationMetrics) {}

        fn importance(&self, ranked: &[FeatureImportance]) {
            *self.shown.borrow_mut() = ranked.len();
        }
    }

    fn config(dir: &std::path::Path, rows: usize) -> TrainConfig {
        TrainConfig {
            data_path: write_employee_csv(dir, rows, 2024),
            model_path: dir.join("model").join("attritionModel.zip"),
            seed: Some(42),
            permutation_count: 3,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn reference_sized_logistic_run_beats_chance() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), 1470);
        let recorder = Recorder::default();
        let outcome = TrainUseCase::new(cfg.clone()).execute(&recorder).unwrap();

        assert_eq!(outcome.train_rows, 1176);
        assert_eq!(outcome.test_rows, 294);
        assert!(outcome.metrics.auc > 0.5 && outcome.metrics.auc < 1.0, "auc {}", outcome.metrics.auc);
        assert_eq!(
            *recorder.stages.borrow(),
            vec![
                Stage::PreparingData,
                Stage::PreparedData,
                Stage::Training,
                Stage::TrainedAndSaved,
                Stage::Evaluating,
            ]
        );
        assert_eq!(*recorder.shown.borrow(), 10);
        assert_eq!(outcome.importance.len(), outcome.model.pipeline().num_features());

        // the saved model scores exactly like the one in memory
        let store = ModelStore::new(&cfg.model_path);
        let loaded = store.load().unwrap();
        assert_eq!(loaded, outcome.model);
        let all = CsvLoader::new(&cfg.data_path).load_all().unwrap();
        assert_eq!(evaluate(&loaded, &all).unwrap(), evaluate(&outcome.model, &all).unwrap());
        assert_eq!(store.load_config::<TrainConfig>().unwrap(), cfg);

        let log = std::fs::read_to_string(store.dir().join("training_log.csv")).unwrap();
        assert_eq!(log.lines().count(), 1 + 100);
    }

    #[test]
    fn boosted_trees_run_with_hashed_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            trainer: TrainerKind::BoostedTrees(BoostConfig { rounds: 15, ..BoostConfig::default() }),
            encoding: CategoricalEncoding::Hashed { bits: 4 },
            importance: false,
            ..config(dir.path(), 400)
        };
        let outcome = TrainUseCase::new(cfg).execute(&Silent).unwrap();
        assert_eq!(outcome.model.manifest().trainer, "boosted-trees");
        assert_eq!(outcome.model.pipeline().num_features(), 22 + 7 * 16);
        assert!(outcome.importance.is_empty());
    }

    #[test]
    fn empty_training_split_is_a_training_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            data_path: write_employee_csv(dir.path(), 1, 3),
            model_path: dir.path().join("m.zip"),
            test_fraction: 0.6,
            seed: Some(1),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).execute(&Silent).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<AttritionError>(),
            Some(AttritionError::TrainingFailure(_))
        ));
        assert!(!dir.path().join("m.zip").exists());
    }

    #[test]
    fn missing_data_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            data_path: dir.path().join("absent.csv"),
            model_path: dir.path().join("m.zip"),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).execute(&Silent).err().unwrap();
        assert!(format!("{err:#}").contains("File not found"));
    }
}
