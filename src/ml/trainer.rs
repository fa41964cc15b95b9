// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fits the feature pipeline on the training rows, then fits the
// chosen classifier on the pipeline output.
//
//   LogisticRegression → burn Linear(d, 1) on Autodiff<NdArray>,
//                        BCE-with-logits + L2, Adam, mini-batches
//                        from DataLoaderBuilder shuffled per epoch
//   BoostedTrees       → histogram GBDT (ml::boosting)
//
// Burn notes:
//   - Training uses TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() drops the autodiff wrapper before the
//     coefficients are copied out into a LogisticModel
//   - no worker threads: batches are built on the calling thread

use burn::{
    backend::{Autodiff, NdArray},
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::FeatureBatcher,
    dataset::FeatureDataset,
    pipeline::{FeatureMatrix, FittedPipeline, PipelineSpec},
};
use crate::domain::dataset::Dataset;
use crate::error::{AttritionError, Result};
use crate::infra::{
    metrics::EpochMetrics,
    session::{Session, SHUFFLE_STREAM},
};
use crate::ml::{
    boosting::{BoostConfig, BoostedTrees},
    classifier::{Classifier, TrainedModel},
    model::{LogisticModel, LogisticNet, LogisticNetConfig},
};

type TrainBackend = Autodiff<NdArray>;

// ─── Trainer configuration ───────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    pub l2:            f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            epochs:        100,
            batch_size:    64,
            learning_rate: 0.05,
            l2:            1e-3,
        }
    }
}

impl LogisticConfig {
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 || self.batch_size == 0 {
            return Err(AttritionError::InvalidArgument(
                "epochs and batch size must be at least 1".into(),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(AttritionError::InvalidArgument(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.l2.is_finite() && self.l2 >= 0.0) {
            return Err(AttritionError::InvalidArgument(format!(
                "l2 must be non-negative, got {}",
                self.l2
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrainerKind {
    LogisticRegression(LogisticConfig),
    BoostedTrees(BoostConfig),
}

impl TrainerKind {
    pub fn name(&self) -> &'static str {
        match self {
            TrainerKind::LogisticRegression(_) => "logistic",
            TrainerKind::BoostedTrees(_) => "boosted-trees",
        }
    }

    /// Whether the feature pipeline should end with min-max scaling.
    pub fn wants_normalized_features(&self) -> bool {
        matches!(self, TrainerKind::LogisticRegression(_))
    }
}

pub struct TrainingOutcome {
    pub model: TrainedModel,
    /// Mean training loss per epoch (logistic) or round (trees)
    pub history: Vec<EpochMetrics>,
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct Trainer<'a> {
    session: &'a Session,
    kind: TrainerKind,
}

impl<'a> Trainer<'a> {
    pub fn new(session: &'a Session, kind: TrainerKind) -> Self {
        Self { session, kind }
    }

    pub fn kind(&self) -> &TrainerKind {
        &self.kind
    }

    /// Fit `spec` on `data`, then the classifier on the encoded rows.
    pub fn fit(&self, spec: &PipelineSpec, data: &Dataset) -> Result<TrainingOutcome> {
        if data.is_empty() {
            return Err(AttritionError::TrainingFailure("training set is empty".into()));
        }
        let pipeline = spec.fit(data)?;
        let features = pipeline.transform(data)?;
        tracing::info!(
            "Encoded {} training rows into {} features",
            features.len(),
            features.width()
        );
        self.fit_features(pipeline, &features)
    }

    pub fn fit_features(&self, pipeline: FittedPipeline, features: &FeatureMatrix) -> Result<TrainingOutcome> {
        check_trainable(features)?;

        let (classifier, history) = match &self.kind {
            TrainerKind::LogisticRegression(cfg) => {
                let (model, history) = train_logistic(cfg, features, self.session)?;
                (Classifier::Logistic(model), history)
            }
            TrainerKind::BoostedTrees(cfg) => {
                let (model, history) = BoostedTrees::fit(cfg, features)?;
                (Classifier::BoostedTrees(model), history)
            }
        };

        if let Some(last) = history.last() {
            tracing::info!(
                "Trained {} classifier: final train_loss={:.5}",
                self.kind.name(),
                last.train_loss
            );
        }
        Ok(TrainingOutcome { model: TrainedModel::new(pipeline, classifier)?, history })
    }
}

fn check_trainable(features: &FeatureMatrix) -> Result<()> {
    if features.is_empty() {
        return Err(AttritionError::TrainingFailure("training set is empty".into()));
    }
    if features.width() == 0 {
        return Err(AttritionError::TrainingFailure("feature vector is empty".into()));
    }
    let positives = features.labels().iter().filter(|&&y| y).count();
    if positives == 0 || positives == features.len() {
        return Err(AttritionError::TrainingFailure(
            "training labels contain a single class".into(),
        ));
    }
    Ok(())
}

fn train_logistic(
    cfg:      &LogisticConfig,
    features: &FeatureMatrix,
    session:  &Session,
) -> Result<(LogisticModel, Vec<EpochMetrics>)> {
    cfg.validate()?;
    let device = session.device().clone();

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: LogisticNet<TrainBackend> = LogisticNetConfig::new(features.width()).init(&device);

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Training data loader ──────────────────────────────────────────────────
    let batcher = FeatureBatcher::<TrainBackend>::new(device);
    let loader = DataLoaderBuilder::new(batcher)
        .batch_size(cfg.batch_size)
        .shuffle(session.stream_seed(SHUFFLE_STREAM))
        .build(FeatureDataset::from_matrix(features));

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut history = Vec::with_capacity(cfg.epochs);
    let mut best_loss = f64::INFINITY;
    for epoch in 1..=cfg.epochs {
        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        for batch in loader.iter() {
            let loss = model.forward_loss(batch.features, batch.labels, cfg.l2);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                return Err(AttritionError::TrainingFailure(format!(
                    "training loss became non-finite in epoch {epoch}"
                )));
            }
            loss_sum += loss_val;
            batches  += 1;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        let metrics = EpochMetrics::new(epoch, loss_sum / batches.max(1) as f64);
        if metrics.is_improvement(best_loss) {
            best_loss = metrics.train_loss;
        }
        tracing::debug!(
            "Epoch {:>3}/{} | train_loss={:.5} | best={:.5}",
            epoch,
            cfg.epochs,
            metrics.train_loss,
            best_loss
        );
        history.push(metrics);
    }

    Ok((model.valid().to_scorer()?, history))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::pipeline::CategoricalEncoding;
    use crate::domain::traits::BinaryScorer;
    use crate::test_support::employee_dataset;

    /// Label is `x0 > 0.5`; x1 is a constant distractor.
    fn separable() -> FeatureMatrix {
        let n = 200;
        let mut values = Vec::with_capacity(n * 2);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let x = i as f32 / n as f32;
            values.extend([x, 1.0]);
            labels.push(x > 0.5);
        }
        FeatureMatrix::new(values, 2, labels, vec!["x0".into(), "x1".into()]).unwrap()
    }

    fn fast_logistic() -> TrainerKind {
        TrainerKind::LogisticRegression(LogisticConfig { epochs: 30, batch_size: 32, learning_rate: 0.1, l2: 0.0 })
    }

    fn employee_pipeline() -> FittedPipeline {
        let data = employee_dataset(40, 1);
        PipelineSpec::attrition(data.schema(), CategoricalEncoding::Index, true)
            .fit(&data)
            .unwrap()
    }

    #[test]
    fn logistic_learns_a_separable_rule() {
        let session = Session::new(Some(11));
        let data = separable();
        let cfg = LogisticConfig { epochs: 30, batch_size: 32, learning_rate: 0.1, l2: 0.0 };
        let (model, history) = train_logistic(&cfg, &data, &session).unwrap();

        assert_eq!(history.len(), 30);
        assert!(history.last().unwrap().train_loss < history[0].train_loss);
        assert!(model.weights()[0] > 0.0);
        assert!(model.score(&[0.95, 1.0]) > model.score(&[0.05, 1.0]));
    }

    #[test]
    fn seeded_logistic_runs_are_identical() {
        let data = separable();
        let cfg = LogisticConfig { epochs: 5, batch_size: 16, learning_rate: 0.1, l2: 1e-3 };
        let (a, _) = train_logistic(&cfg, &data, &Session::new(Some(5))).unwrap();
        let (b, _) = train_logistic(&cfg, &data, &Session::new(Some(5))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn single_class_is_a_training_failure() {
        let session = Session::new(Some(1));
        let data = FeatureMatrix::new(vec![0.1, 0.2], 1, vec![true, true], vec!["x".into()]).unwrap();
        let trainer = Trainer::new(&session, fast_logistic());
        let err = trainer.fit_features(employee_pipeline(), &data).err().unwrap();
        assert!(matches!(err, AttritionError::TrainingFailure(_)));
    }

    #[test]
    fn empty_dataset_is_a_training_failure() {
        let session = Session::new(Some(1));
        let data = employee_dataset(10, 2);
        let empty = data.with_rows(Vec::new());
        let spec = PipelineSpec::attrition(data.schema(), CategoricalEncoding::Index, true);
        let err = Trainer::new(&session, fast_logistic()).fit(&spec, &empty).err().unwrap();
        assert!(matches!(err, AttritionError::TrainingFailure(_)));
    }

    #[test]
    fn invalid_hyperparameters_are_rejected() {
        let cfg = LogisticConfig { batch_size: 0, ..LogisticConfig::default() };
        assert!(matches!(cfg.validate(), Err(AttritionError::InvalidArgument(_))));
        let cfg = LogisticConfig { l2: -1.0, ..LogisticConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn fits_both_trainers_on_employee_rows() {
        let session = Session::new(Some(21));
        let data = employee_dataset(300, 9);
        for (kind, normalize) in [
            (fast_logistic(), true),
            (
                TrainerKind::BoostedTrees(BoostConfig { rounds: 10, min_leaf: 10, ..BoostConfig::default() }),
                false,
            ),
        ] {
            let spec = PipelineSpec::attrition(data.schema(), CategoricalEncoding::Index, normalize);
            let outcome = Trainer::new(&session, kind.clone()).fit(&spec, &data).unwrap();
            assert_eq!(outcome.model.manifest().trainer, kind.name());
            assert_eq!(outcome.model.classifier().num_features(), outcome.model.pipeline().num_features());
            assert!(!outcome.history.is_empty());
        }
    }
}
