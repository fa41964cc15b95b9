// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates everything else to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — fits, saves and evaluates a classifier
//   2. `evaluate` — reloads a saved model and scores a CSV

pub mod commands;

/// Console output for use-case progress
pub mod report;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};
use report::ConsoleReporter;

#[derive(Parser, Debug)]
#[command(
    name = "attrition",
    version,
    about = "Train and evaluate an employee attrition classifier on tabular HR data."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the use case; the CLI layer never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training on employees in: {}", args.data.display());
    let use_case = TrainUseCase::new(args.into());
    let outcome = use_case.execute(&ConsoleReporter)?;

    tracing::info!(
        "Saved {} to '{}'",
        outcome.model,
        use_case.config().model_path.display()
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let use_case = EvaluateUseCase::new(args.into());
    let outcome = use_case.execute(&ConsoleReporter)?;
    tracing::info!("Evaluated {} rows", outcome.rows);
    Ok(())
}
