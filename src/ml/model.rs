use burn::{
    nn::{
        loss::BinaryCrossEntropyLossConfig,
        Initializer, Linear, LinearConfig,
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::domain::traits::BinaryScorer;
use crate::error::AttritionError;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize;
// adding them again gives conflicting impls.
#[derive(Config, Debug)]
pub struct LogisticNetConfig {
    pub num_features: usize,
}

impl LogisticNetConfig {
    /// Zero-initialised weights and bias.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LogisticNet<B> {
        let linear = LinearConfig::new(self.num_features, 1)
            .with_initializer(Initializer::Zeros)
            .init(device);
        LogisticNet { linear }
    }
}

/// Logistic regression as a single linear layer producing one logit.
#[derive(Module, Debug)]
pub struct LogisticNet<B: Backend> {
    pub linear: Linear<B>,
}

impl<B: Backend> LogisticNet<B> {
    /// features: [batch, num_features] → logits: [batch]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 1> {
        let [batch_size, _] = features.dims();
        self.linear.forward(features).reshape([batch_size])
    }

    /// Binary cross-entropy on logits plus an L2 penalty of l2/2 · ‖w‖².
    pub fn forward_loss(
        &self,
        features: Tensor<B, 2>,
        labels:   Tensor<B, 1, Int>,
        l2:       f64,
    ) -> Tensor<B, 1> {
        let logits = self.forward(features);
        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device());
        let w = self.linear.weight.val();
        let penalty = (w.clone() * w).sum() * (l2 / 2.0);
        bce.forward(logits, labels) + penalty
    }

    /// Copy the fitted coefficients out of the tensors.
    pub fn to_scorer(&self) -> crate::error::Result<LogisticModel> {
        let weights = self
            .linear
            .weight
            .val()
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| AttritionError::TrainingFailure(format!("reading weights: {e:?}")))?;
        let bias = match &self.linear.bias {
            Some(b) => b
                .val()
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| AttritionError::TrainingFailure(format!("reading bias: {e:?}")))?
                .first()
                .copied()
                .unwrap_or(0.0),
            None => 0.0,
        };
        Ok(LogisticModel::new(weights, bias))
    }
}

/// Fitted logistic regression: P(attrition) = sigmoid(w · x + b).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    weights: Vec<f32>,
    bias: f32,
}

impl LogisticModel {
    pub fn new(weights: Vec<f32>, bias: f32) -> Self {
        Self { weights, bias }
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn logit(&self, features: &[f32]) -> f32 {
        self.weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f32>()
            + self.bias
    }
}

impl BinaryScorer for LogisticModel {
    fn score(&self, features: &[f32]) -> f32 {
        sigmoid(self.logit(features))
    }

    fn num_features(&self) -> usize {
        self.weights.len()
    }

    fn feature_weights(&self) -> Option<Vec<f32>> {
        Some(self.weights.clone())
    }
}

pub fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}
