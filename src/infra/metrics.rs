// ============================================================
// Layer 6 — Run Log
// ============================================================
// Appends training progress and evaluation results to CSV
// files next to the saved model.
//
//   training_log.csv    trainer,epoch,train_loss
//   evaluation_log.csv  timestamp,trainer,rows,auc,accuracy,f1,log_loss
//
// Headers are written only when a file is first created, so
// successive runs append to the same log.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{AttritionError, Result};
use crate::ml::evaluator::BinaryClassificationMetrics;

const TRAINING_HEADER: &str = "trainer,epoch,train_loss";
const EVALUATION_HEADER: &str = "timestamp,trainer,rows,auc,accuracy,f1,log_loss";

/// Mean training loss after one epoch (logistic) or one boosting round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,
    pub train_loss: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64) -> Self {
        Self { epoch, train_loss }
    }

    pub fn is_improvement(&self, best_loss: f64) -> bool {
        self.train_loss < best_loss
    }
}

pub struct MetricsLogger {
    training_csv: PathBuf,
    evaluation_csv: PathBuf,
}

impl MetricsLogger {
    /// Log into `dir`, creating it if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| AttritionError::io(dir, e))?;

        let logger = Self {
            training_csv: dir.join("training_log.csv"),
            evaluation_csv: dir.join("evaluation_log.csv"),
        };
        ensure_header(&logger.training_csv, TRAINING_HEADER)?;
        ensure_header(&logger.evaluation_csv, EVALUATION_HEADER)?;
        Ok(logger)
    }

    pub fn log_epoch(&self, trainer: &str, m: &EpochMetrics) -> Result<()> {
        append_line(
            &self.training_csv,
            &format!("{},{},{:.6}", trainer, m.epoch, m.train_loss),
        )
    }

    pub fn log_history(&self, trainer: &str, history: &[EpochMetrics]) -> Result<()> {
        for m in history {
            self.log_epoch(trainer, m)?;
        }
        tracing::debug!(
            "Logged {} epochs to '{}'",
            history.len(),
            self.training_csv.display()
        );
        Ok(())
    }

    pub fn log_evaluation(
        &self,
        trainer: &str,
        rows: usize,
        m: &BinaryClassificationMetrics,
    ) -> Result<()> {
        append_line(
            &self.evaluation_csv,
            &format!(
                "{},{},{},{:.6},{:.6},{:.6},{:.6}",
                chrono::Utc::now().to_rfc3339(),
                trainer,
                rows,
                m.auc,
                m.accuracy,
                m.f1_score,
                m.log_loss,
            ),
        )
    }

    #[cfg(test)]
    fn training_csv(&self) -> &Path {
        &self.training_csv
    }
}

fn ensure_header(path: &Path, header: &str) -> Result<()> {
    if !path.exists() {
        let mut f = fs::File::create(path).map_err(|e| AttritionError::io(path, e))?;
        writeln!(f, "{header}").map_err(|e| AttritionError::io(path, e))?;
        tracing::debug!("Created run log '{}'", path.display());
    }
    Ok(())
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| AttritionError::io(path, e))?;
    writeln!(f, "{line}").map_err(|e| AttritionError::io(path, e))
}
