// ============================================================
// Layer 5 — Gradient-Boosted Trees
// ============================================================
// Histogram boosting with logistic loss:
//
//   bias      = ln(p / (1 - p))           p = training positive rate
//   round t:  g = sigmoid(F) - y,  h = sigmoid(F)·(1 - sigmoid(F))
//             grow one tree on (g, h) over binned features
//             F += tree(x)
//
// Every feature is bucketed once into at most `max_bins` bins.
// A split at bin edge k sends x <= edge[k] left. Split gain and
// leaf values are the usual second-order ones:
//
//   gain = GL²/(HL+λ) + GR²/(HR+λ) - G²/(H+λ)
//   leaf = -G/(H+λ) · learning_rate
//
// The total gain each feature earned across all splits is kept
// as its model weight.

use serde::{Deserialize, Serialize};

use crate::data::pipeline::FeatureMatrix;
use crate::domain::traits::BinaryScorer;
use crate::error::{AttritionError, Result};
use crate::infra::metrics::EpochMetrics;
use crate::ml::model::sigmoid;

const MIN_HESSIAN: f32 = 1e-6;
const MAX_BINS_LIMIT: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostConfig {
    pub rounds:        usize,
    pub learning_rate: f32,
    pub max_depth:     usize,
    pub min_leaf:      usize,
    pub lambda:        f32,
    pub max_bins:      usize,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            rounds:        100,
            learning_rate: 0.1,
            max_depth:     4,
            min_leaf:      20,
            lambda:        1.0,
            max_bins:      255,
        }
    }
}

impl BoostConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            return Err(AttritionError::InvalidArgument("rounds must be at least 1".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(AttritionError::InvalidArgument(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.max_depth == 0 || self.min_leaf == 0 {
            return Err(AttritionError::InvalidArgument(
                "max depth and min leaf size must be at least 1".into(),
            ));
        }
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return Err(AttritionError::InvalidArgument(format!(
                "lambda must be non-negative, got {}",
                self.lambda
            )));
        }
        if !(2..=MAX_BINS_LIMIT).contains(&self.max_bins) {
            return Err(AttritionError::InvalidArgument(format!(
                "max bins must be in 2..={MAX_BINS_LIMIT}, got {}",
                self.max_bins
            )));
        }
        Ok(())
    }
}

// ─── Trees ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf { value: f32 },
    /// `x[feature] <= threshold` goes to `left`
    Split { feature: usize, threshold: f32, left: usize, right: usize },
}

/// Nodes stored flat; the root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn predict(&self, features: &[f32]) -> f32 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    index = if features[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], i: usize) -> usize {
            match &nodes[i] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedTrees {
    bias: f32,
    trees: Vec<Tree>,
    num_features: usize,
    /// Summed split gain per feature slot
    gains: Vec<f32>,
}

impl BoostedTrees {
    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn gains(&self) -> &[f32] {
        &self.gains
    }

    pub fn raw_score(&self, features: &[f32]) -> f32 {
        self.bias + self.trees.iter().map(|t| t.predict(features)).sum::<f32>()
    }

    /// Fit on a feature matrix. Returns the model and the mean
    /// training log-loss after each round.
    pub fn fit(cfg: &BoostConfig, data: &FeatureMatrix) -> Result<(Self, Vec<EpochMetrics>)> {
        cfg.validate()?;
        let n = data.len();
        let d = data.width();
        if n == 0 || d == 0 {
            return Err(AttritionError::TrainingFailure(format!(
                "cannot boost on {n} rows with {d} features"
            )));
        }

        let targets: Vec<f32> = data.labels().iter().map(|&y| if y { 1.0 } else { 0.0 }).collect();
        let positive_rate = targets.iter().sum::<f32>() / n as f32;
        if positive_rate <= 0.0 || positive_rate >= 1.0 {
            return Err(AttritionError::TrainingFailure(
                "training labels contain a single class".into(),
            ));
        }
        let bias = (positive_rate / (1.0 - positive_rate)).ln();

        let binned = BinnedFeatures::new(data, cfg.max_bins);
        tracing::debug!(
            "Binned {} features into at most {} bins each",
            d,
            cfg.max_bins
        );

        let mut model = Self { bias, trees: Vec::with_capacity(cfg.rounds), num_features: d, gains: vec![0.0; d] };
        let mut raw = vec![bias; n];
        let mut grad = vec![0.0f32; n];
        let mut hess = vec![0.0f32; n];
        let mut history = Vec::with_capacity(cfg.rounds);

        for round in 1..=cfg.rounds {
            for i in 0..n {
                let p = sigmoid(raw[i]);
                grad[i] = p - targets[i];
                hess[i] = (p * (1.0 - p)).max(MIN_HESSIAN);
            }

            let mut grower = TreeGrower {
                cfg,
                binned: &binned,
                grad: &grad,
                hess: &hess,
                nodes: Vec::new(),
                gains: &mut model.gains,
            };
            let rows: Vec<usize> = (0..n).collect();
            grower.grow(rows, 0);
            let tree = Tree { nodes: grower.nodes };

            for (i, r) in raw.iter_mut().enumerate() {
                *r += tree.predict(data.row(i));
            }
            model.trees.push(tree);

            let loss = mean_log_loss(&raw, &targets);
            if !loss.is_finite() {
                return Err(AttritionError::TrainingFailure(format!(
                    "training loss became non-finite at round {round}"
                )));
            }
            tracing::debug!("Round {:>3}/{} | train_loss={:.5}", round, cfg.rounds, loss);
            history.push(EpochMetrics::new(round, loss));
        }

        Ok((model, history))
    }
}

impl BinaryScorer for BoostedTrees {
    fn score(&self, features: &[f32]) -> f32 {
        sigmoid(self.raw_score(features))
    }

    fn num_features(&self) -> usize {
        self.num_features
    }

    fn feature_weights(&self) -> Option<Vec<f32>> {
        Some(self.gains.clone())
    }
}

fn mean_log_loss(raw: &[f32], targets: &[f32]) -> f64 {
    let total: f64 = raw
        .iter()
        .zip(targets)
        .map(|(&z, &y)| {
            // log(1 + e^z) - y·z, stable for large |z|
            let z = z as f64;
            let softplus = if z > 0.0 { z + (-z).exp().ln_1p() } else { z.exp().ln_1p() };
            softplus - y as f64 * z
        })
        .sum();
    total / raw.len() as f64
}

// ─── Binning ──────────────────────────────────────────────────────────────────
struct BinnedFeatures {
    /// Row-major bin index per cell
    bins: Vec<u16>,
    width: usize,
    /// Upper edge of every bin except the last, per feature
    edges: Vec<Vec<f32>>,
}

impl BinnedFeatures {
    fn new(data: &FeatureMatrix, max_bins: usize) -> Self {
        let width = data.width();
        let edges: Vec<Vec<f32>> = (0..width).map(|j| bin_edges(data.column(j), max_bins)).collect();

        let mut bins = Vec::with_capacity(data.len() * width);
        for i in 0..data.len() {
            for (x, e) in data.row(i).iter().zip(&edges) {
                bins.push(e.partition_point(|edge| edge < x) as u16);
            }
        }
        Self { bins, width, edges }
    }

    fn bin(&self, row: usize, feature: usize) -> usize {
        self.bins[row * self.width + feature] as usize
    }
}

/// Distinct values below the maximum when few enough, else quantiles.
fn bin_edges(mut values: Vec<f32>, max_bins: usize) -> Vec<f32> {
    values.sort_by(f32::total_cmp);
    let Some(&max) = values.last() else {
        return Vec::new();
    };

    let mut unique = values.clone();
    unique.dedup();
    let mut edges = if unique.len() <= max_bins {
        unique
    } else {
        let n = values.len();
        let mut q: Vec<f32> = (1..max_bins).map(|k| values[k * n / max_bins]).collect();
        q.dedup();
        q
    };
    edges.retain(|&e| e < max);
    edges
}

// ─── Tree growth ──────────────────────────────────────────────────────────────
struct TreeGrower<'a> {
    cfg: &'a BoostConfig,
    binned: &'a BinnedFeatures,
    grad: &'a [f32],
    hess: &'a [f32],
    nodes: Vec<Node>,
    gains: &'a mut Vec<f32>,
}

struct BestSplit {
    feature: usize,
    bin: usize,
    gain: f32,
}

impl TreeGrower<'_> {
    /// Grow the subtree for `rows`, returning its node index.
    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let (g, h) = self.sums(&rows);
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { value: self.leaf_value(g, h) });

        if depth >= self.cfg.max_depth || rows.len() < 2 * self.cfg.min_leaf {
            return index;
        }
        let Some(best) = self.best_split(&rows, g, h) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.binned.bin(r, best.feature) <= best.bin);
        self.gains[best.feature] += best.gain;

        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[index] = Node::Split {
            feature: best.feature,
            threshold: self.binned.edges[best.feature][best.bin],
            left,
            right,
        };
        index
    }

    fn sums(&self, rows: &[usize]) -> (f32, f32) {
        rows.iter().fold((0.0, 0.0), |(g, h), &r| (g + self.grad[r], h + self.hess[r]))
    }

    fn leaf_value(&self, g: f32, h: f32) -> f32 {
        -g / (h + self.cfg.lambda) * self.cfg.learning_rate
    }

    fn score(&self, g: f32, h: f32) -> f32 {
        g * g / (h + self.cfg.lambda)
    }

    fn best_split(&self, rows: &[usize], g: f32, h: f32) -> Option<BestSplit> {
        let parent = self.score(g, h);
        let min_leaf = self.cfg.min_leaf;
        let mut best: Option<BestSplit> = None;

        for (feature, edges) in self.binned.edges.iter().enumerate() {
            if edges.is_empty() {
                continue;
            }
            // (gradient, hessian, count) per bin
            let mut hist = vec![(0.0f32, 0.0f32, 0usize); edges.len() + 1];
            for &r in rows {
                let slot = &mut hist[self.binned.bin(r, feature)];
                slot.0 += self.grad[r];
                slot.1 += self.hess[r];
                slot.2 += 1;
            }

            let (mut gl, mut hl, mut nl) = (0.0f32, 0.0f32, 0usize);
            for (bin, &(bg, bh, bn)) in hist.iter().take(edges.len()).enumerate() {
                gl += bg;
                hl += bh;
                nl += bn;
                let nr = rows.len() - nl;
                if nl < min_leaf || nr < min_leaf {
                    continue;
                }
                let gain = self.score(gl, hl) + self.score(g - gl, h - hl) - parent;
                if gain > best.as_ref().map_or(1e-6, |b| b.gain) {
                    best = Some(BestSplit { feature, bin, gain });
                }
            }
        }
        best
    }
}
