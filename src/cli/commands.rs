// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `score`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::data::tfidf::TfidfConfig;
use crate::ml::trainer::ClassifierConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the classifier on labelled REAL/FAKE news CSVs
    Train(TrainArgs),

    /// Score a piece of text with a trained model
    Score(ScoreArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV of real news articles (needs `title` and `text` columns)
    #[arg(long, default_value = "data/True.csv")]
    pub real_csv: String,

    /// CSV of fake news articles (same layout)
    #[arg(long, default_value = "data/Fake.csv")]
    pub fake_csv: String,

    /// Directory to write the model artifact and reports into
    #[arg(long, env = "MISINFO_MODEL_DIR", default_value = "models")]
    pub model_dir: String,

    /// Maximum TF-IDF vocabulary size
    #[arg(long, default_value_t = 5000)]
    pub max_features: usize,

    /// Maximum number of training epochs
    #[arg(long, default_value_t = 100)]
    pub max_iter: usize,

    /// Inverse regularization strength — smaller means stronger L2
    #[arg(long, default_value_t = 1.0)]
    pub c: f64,

    /// Adam step size
    #[arg(long, default_value_t = 0.05)]
    pub learning_rate: f64,

    /// Samples per optimizer step
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Stop once the objective improves by less than this (relative)
    #[arg(long, default_value_t = 1e-4)]
    pub tol: f64,

    /// Share of the corpus held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub eval_fraction: f64,

    /// Seed for the split and mini-batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Prepend each article's title to its body text
    #[arg(long)]
    pub include_title: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            real_csv:      a.real_csv,
            fake_csv:      a.fake_csv,
            model_dir:     a.model_dir,
            include_title: a.include_title,
            eval_fraction: a.eval_fraction,
            seed:          a.seed,
            features:      TfidfConfig::new(a.max_features),
            classifier:    ClassifierConfig {
                c:             a.c,
                max_iter:      a.max_iter,
                tol:           a.tol,
                learning_rate: a.learning_rate,
                batch_size:    a.batch_size,
                seed:          a.seed,
            },
        }
    }
}

/// All arguments for the `score` command
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// The text to score
    #[arg(long)]
    pub text: String,

    /// Directory the model was trained into
    #[arg(long, env = "MISINFO_MODEL_DIR", default_value = "models")]
    pub model_dir: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_args_map_to_config() {
        let cli = Cli::try_parse_from([
            "misinfo-scorer", "train",
            "--real-csv", "r.csv", "--fake-csv", "f.csv",
            "--max-features", "100", "--c", "0.5", "--seed", "7",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.real_csv, "r.csv");
        assert_eq!(cfg.features.max_features, 100);
        assert_eq!(cfg.classifier.c, 0.5);
        assert_eq!(cfg.classifier.seed, 7);
        assert_eq!(cfg.seed, 7);
        assert!(!cfg.include_title);
    }

    #[test]
    fn test_score_requires_text() {
        assert!(Cli::try_parse_from(["misinfo-scorer", "score"]).is_err());
    }
}
