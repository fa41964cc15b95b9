// ============================================================
// Layer 4 — Feature Batcher
// ============================================================
// Implements burn's Batcher trait to stack FeatureSamples into
// tensors for one optimiser step.
//
//   Input:  Vec of N samples, each with D features
//   Output: FeatureBatch { features: [N, D] float, labels: [N] int }
//
// The features are flattened row by row, then reshaped:
//   [s1_f1, s1_f2, ..., s1_fD, s2_f1, ..., sN_fD] → [N, D]

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::FeatureSample;

// ─── FeatureBatch ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct FeatureBatch<B: Backend> {
    /// Encoded features — shape: [batch_size, num_features]
    pub features: Tensor<B, 2>,

    /// Attrition labels as 0/1 — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── FeatureBatcher ───────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct FeatureBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> FeatureBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<FeatureSample, FeatureBatch<B>> for FeatureBatcher<B> {
    fn batch(&self, items: Vec<FeatureSample>) -> FeatureBatch<B> {
        let batch_size   = items.len();
        // every sample comes from the same fitted pipeline
        let num_features = items.first().map(|s| s.features.len()).unwrap_or(0);

        let flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        let labels: Vec<i64> = items
            .iter()
            .map(|s| i64::from(s.label))
            .collect();

        let features = Tensor::<B, 2>::from_data(
            TensorData::new(flat, [batch_size, num_features]),
            &self.device,
        );
        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            &self.device,
        );

        FeatureBatch { features, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn stacks_samples_into_tensors() {
        let batcher = FeatureBatcher::<NdArray>::new(Default::default());
        let batch = batcher.batch(vec![
            FeatureSample { features: vec![1.0, 2.0, 3.0], label: true },
            FeatureSample { features: vec![4.0, 5.0, 6.0], label: false },
        ]);

        assert_eq!(batch.features.dims(), [2, 3]);
        assert_eq!(batch.labels.dims(), [2]);

        let flat = batch.features.into_data().to_vec::<f32>().unwrap();
        assert_eq!(flat, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let labels = batch.labels.into_data().to_vec::<i64>().unwrap();
        assert_eq!(labels, vec![1, 0]);
    }
}
