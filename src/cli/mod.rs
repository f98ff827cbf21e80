// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train` — fits TF-IDF + logistic regression on two CSVs
//   2. `score` — loads the model and prints P(FAKE) for a text
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, ScoreArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "misinfo-scorer",
    version,
    about = "Train a fake-news text classifier, then score text with it."
)]
pub struct Cli {
    /// The subcommand to run (train or score)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Score(args) => run_score(args),
        }
    }
}

/// Handles the `train` subcommand.
fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training on '{}' (REAL) and '{}' (FAKE)", args.real_csv, args.fake_csv);

    let use_case = TrainUseCase::new(args.into());
    let report   = use_case.execute().context("training failed")?;

    println!("Training complete (run {}).", report.run_id);
    println!(
        "  documents: {} train / {} eval ({} rows skipped)",
        report.train_size,
        report.eval_size,
        report.load_stats.skipped()
    );
    println!("  vocabulary: {} terms", report.vocabulary_size);
    println!(
        "  optimizer: {} epochs, {}",
        report.epochs,
        if report.converged { "converged" } else { "did not converge" }
    );

    match &report.evaluation {
        Some(eval) => println!("\n{eval}"),
        None => println!("\nEvaluation unavailable (see log)."),
    }

    if !report.samples.is_empty() {
        println!("\nSample predictions:");
        for s in &report.samples {
            println!(
                "  {:<24} {:<4}  REAL {:.4}  FAKE {:.4}",
                s.source, s.label.to_string(), s.probabilities[0], s.probabilities[1]
            );
        }
    }

    println!("\nModel saved to '{}'.", report.run_dir.display());
    Ok(())
}

/// Handles the `score` subcommand.
fn run_score(args: ScoreArgs) -> Result<()> {
    use crate::application::score_use_case::ScoreUseCase;

    let use_case   = ScoreUseCase::from_model_dir(&args.model_dir);
    let prediction = use_case
        .predict(&args.text)
        .with_context(|| format!("cannot score with the model in '{}'", args.model_dir))?;

    println!(
        "Our model predicts there is a {:.2}% chance this is fake news.",
        prediction.fake_percent()
    );
    if prediction.low_confidence {
        println!("(low confidence: the text has no content words after normalization)");
    }
    Ok(())
}
