// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, and all
// their configurable flags. Running `train` with no flags reads
// ./data/attrition.csv and writes ./model/attritionModel.zip.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{evaluate_use_case::EvaluateConfig, train_use_case::TrainConfig};
use crate::data::pipeline::CategoricalEncoding;
use crate::ml::{
    boosting::BoostConfig,
    trainer::{LogisticConfig, TrainerKind},
};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train, save and evaluate an attrition classifier
    Train(TrainArgs),

    /// Score a labelled CSV with a saved model
    Evaluate(EvaluateArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrainerArg {
    /// Regularised logistic regression
    Logistic,
    /// Gradient-boosted decision trees
    BoostedTrees,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodingArg {
    /// One slot per category seen in training
    Index,
    /// 2^hash-bits slots per column, categories hashed into them
    Hashed,
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Employee CSV with a header row
    #[arg(long, default_value = "./data/attrition.csv")]
    pub data: PathBuf,

    /// Where the trained model zip is written (overwritten)
    #[arg(long, default_value = "./model/attritionModel.zip")]
    pub model: PathBuf,

    /// Share of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed for the split, batching and permutations; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_enum, default_value_t = TrainerArg::Logistic)]
    pub trainer: TrainerArg,

    #[arg(long, value_enum, default_value_t = EncodingArg::Index)]
    pub encoding: EncodingArg,

    /// Bits for hashed encoding (2^bits slots per column, 1-16)
    #[arg(long, default_value_t = 4)]
    pub hash_bits: u32,

    /// Logistic: passes over the training rows
    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Logistic: rows per optimiser step
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Learning rate (default 0.05 for logistic, 0.1 shrinkage for trees)
    #[arg(long)]
    pub lr: Option<f64>,

    /// Logistic: L2 penalty on the weights
    #[arg(long, default_value_t = 1e-3)]
    pub l2: f64,

    /// Trees: boosting rounds
    #[arg(long, default_value_t = 100)]
    pub rounds: usize,

    /// Trees: maximum depth of each tree
    #[arg(long, default_value_t = 4)]
    pub max_depth: usize,

    /// Trees: minimum rows per leaf
    #[arg(long, default_value_t = 20)]
    pub min_leaf: usize,

    /// Shuffles per feature for permutation importance
    #[arg(long, default_value_t = 50)]
    pub permutation_count: usize,

    /// Rows printed in the importance table
    #[arg(long, default_value_t = 10)]
    pub top_features: usize,

    /// Skip permutation importance
    #[arg(long)]
    pub no_importance: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        let trainer = match a.trainer {
            TrainerArg::Logistic => {
                let defaults = LogisticConfig::default();
                TrainerKind::LogisticRegression(LogisticConfig {
                    epochs:        a.epochs,
                    batch_size:    a.batch_size,
                    learning_rate: a.lr.unwrap_or(defaults.learning_rate),
                    l2:            a.l2,
                })
            }
            TrainerArg::BoostedTrees => {
                let defaults = BoostConfig::default();
                TrainerKind::BoostedTrees(BoostConfig {
                    rounds:        a.rounds,
                    learning_rate: a.lr.map_or(defaults.learning_rate, |lr| lr as f32),
                    max_depth:     a.max_depth,
                    min_leaf:      a.min_leaf,
                    ..defaults
                })
            }
        };
        let encoding = match a.encoding {
            EncodingArg::Index => CategoricalEncoding::Index,
            EncodingArg::Hashed => CategoricalEncoding::Hashed { bits: a.hash_bits },
        };

        TrainConfig {
            data_path:         a.data,
            model_path:        a.model,
            test_fraction:     a.test_fraction,
            seed:              a.seed,
            trainer,
            encoding,
            permutation_count: a.permutation_count,
            top_features:      a.top_features,
            importance:        !a.no_importance,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Labelled employee CSV to score
    #[arg(long, default_value = "./data/attrition.csv")]
    pub data: PathBuf,

    /// Model zip written by `train`
    #[arg(long, default_value = "./model/attritionModel.zip")]
    pub model: PathBuf,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig { data_path: a.data, model_path: a.model }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> Commands {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn bare_train_reproduces_fixed_paths() {
        let Commands::Train(args) = parse(&["attrition", "train"]) else {
            panic!("expected train");
        };
        let cfg = TrainConfig::from(args);
        assert_eq!(cfg, TrainConfig::default());
    }

    #[test]
    fn boosted_trees_flags() {
        let Commands::Train(args) = parse(&[
            "attrition", "train", "--trainer", "boosted-trees", "--rounds", "7", "--lr", "0.2",
            "--encoding", "hashed", "--hash-bits", "5", "--seed", "9", "--no-importance",
        ]) else {
            panic!("expected train");
        };
        let cfg = TrainConfig::from(args);
        assert_eq!(cfg.seed, Some(9));
        assert!(!cfg.importance);
        assert_eq!(cfg.encoding, CategoricalEncoding::Hashed { bits: 5 });
        match cfg.trainer {
            TrainerKind::BoostedTrees(b) => {
                assert_eq!(b.rounds, 7);
                assert_eq!(b.learning_rate, 0.2);
            }
            other => panic!("unexpected trainer {other:?}"),
        }
    }

    #[test]
    fn evaluate_defaults() {
        let Commands::Evaluate(args) = parse(&["attrition", "evaluate"]) else {
            panic!("expected evaluate");
        };
        let cfg = EvaluateConfig::from(args);
        assert_eq!(cfg.model_path, PathBuf::from("./model/attritionModel.zip"));
    }

    #[test]
    fn unknown_trainer_is_rejected() {
        assert!(Cli::try_parse_from(["attrition", "train", "--trainer", "sdca"]).is_err());
    }
}
