// ============================================================
// Layer 5 — Trained Model
// ============================================================
// What training produces and what the model store persists:
//
//   TrainedModel
//     ├── FittedPipeline   raw Employee → feature vector
//     ├── Classifier       feature vector → P(attrition)
//     └── ModelManifest    trainer, feature count, slot names, time
//
// Both classifier kinds are plain serde data once fitted, so a
// reloaded model scores exactly like the one that was saved.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::pipeline::FittedPipeline;
use crate::domain::{dataset::Dataset, traits::BinaryScorer};
use crate::error::{AttritionError, Result};
use crate::ml::{boosting::BoostedTrees, model::LogisticModel};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Classifier {
    Logistic(LogisticModel),
    BoostedTrees(BoostedTrees),
}

impl Classifier {
    pub fn name(&self) -> &'static str {
        match self {
            Classifier::Logistic(_) => "logistic",
            Classifier::BoostedTrees(_) => "boosted-trees",
        }
    }

    fn scorer(&self) -> &dyn BinaryScorer {
        match self {
            Classifier::Logistic(m) => m,
            Classifier::BoostedTrees(m) => m,
        }
    }
}

impl BinaryScorer for Classifier {
    fn score(&self, features: &[f32]) -> f32 {
        self.scorer().score(features)
    }

    fn num_features(&self) -> usize {
        self.scorer().num_features()
    }

    fn feature_weights(&self) -> Option<Vec<f32>> {
        self.scorer().feature_weights()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version:      u32,
    pub trainer:      String,
    pub num_features: usize,
    pub slot_names:   Vec<String>,
    pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pipeline: FittedPipeline,
    classifier: Classifier,
    manifest: ModelManifest,
}

impl TrainedModel {
    pub fn new(pipeline: FittedPipeline, classifier: Classifier) -> Result<Self> {
        if pipeline.num_features() != classifier.num_features() {
            return Err(AttritionError::TrainingFailure(format!(
                "pipeline produces {} features but the classifier expects {}",
                pipeline.num_features(),
                classifier.num_features()
            )));
        }
        let manifest = ModelManifest {
            version:      MODEL_FORMAT_VERSION,
            trainer:      classifier.name().to_string(),
            num_features: pipeline.num_features(),
            slot_names:   pipeline.slot_names().to_vec(),
            created_at:   Utc::now(),
        };
        Ok(Self { pipeline, classifier, manifest })
    }

    /// Reassemble a model read back from storage, checking the parts agree.
    pub fn from_parts(
        pipeline:   FittedPipeline,
        classifier: Classifier,
        manifest:   ModelManifest,
    ) -> Result<Self> {
        if manifest.version != MODEL_FORMAT_VERSION {
            return Err(AttritionError::ModelFormat(format!(
                "unsupported model version {} (expected {MODEL_FORMAT_VERSION})",
                manifest.version
            )));
        }
        if manifest.slot_names != pipeline.slot_names()
            || classifier.num_features() != pipeline.num_features()
        {
            return Err(AttritionError::ModelFormat(
                "manifest, pipeline and classifier disagree on the feature layout".into(),
            ));
        }
        Ok(Self { pipeline, classifier, manifest })
    }

    pub fn pipeline(&self) -> &FittedPipeline {
        &self.pipeline
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    /// P(attrition) for every row of `data`, in row order.
    pub fn score_dataset(&self, data: &Dataset) -> Result<Vec<f32>> {
        let features = self.pipeline.transform(data)?;
        Ok(self.classifier.score_rows(features.values()))
    }
}

impl fmt::Display for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} classifier over {} features (trained {})",
            self.manifest.trainer,
            self.manifest.num_features,
            self.manifest.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}
