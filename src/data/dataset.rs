use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::pipeline::FeatureMatrix;

/// One encoded training row: the "Features" vector and its label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSample {
    pub features: Vec<f32>,
    pub label: bool,
}

/// Encoded rows exposed through burn's Dataset trait so the
/// DataLoader can batch and shuffle them.
pub struct FeatureDataset {
    samples: Vec<FeatureSample>,
}

impl FeatureDataset {
    pub fn from_matrix(matrix: &FeatureMatrix) -> Self {
        let samples = (0..matrix.len())
            .map(|i| FeatureSample {
                features: matrix.row(i).to_vec(),
                label:    matrix.labels()[i],
            })
            .collect();
        Self { samples }
    }
}

impl Dataset<FeatureSample> for FeatureDataset {
    fn get(&self, index: usize) -> Option<FeatureSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
