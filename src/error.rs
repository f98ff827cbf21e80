// ============================================================
// Error Taxonomy
// ============================================================
// Typed errors for everything below the CLI layer.
//
// The CLI wraps these with anyhow context before printing;
// the application and lower layers return ScorerError so
// callers can tell "no model yet" apart from "bad corpus".
//
//   ArtifactMissing / ArtifactCorrupt → inference unavailable
//   ArtifactLocked                    → another training run is writing
//   TrainingData                      → corpus unusable, nothing fitted
//   Evaluation                        → evaluation stage only
//   Stage                             → a training stage failed

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Stages of one training run, in the only order they may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrainingStage {
    Idle,
    CorpusLoaded,
    Normalized,
    FeaturesFit,
    ModelFit,
    Evaluated,
    Persisted,
}

impl TrainingStage {
    /// The stage that must follow this one, or None for the terminal stage.
    pub fn next(self) -> Option<Self> {
        use TrainingStage::*;
        match self {
            Idle         => Some(CorpusLoaded),
            CorpusLoaded => Some(Normalized),
            Normalized   => Some(FeaturesFit),
            FeaturesFit  => Some(ModelFit),
            ModelFit     => Some(Evaluated),
            Evaluated    => Some(Persisted),
            Persisted    => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for TrainingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrainingStage::Idle         => "idle",
            TrainingStage::CorpusLoaded => "corpus-loaded",
            TrainingStage::Normalized   => "normalized",
            TrainingStage::FeaturesFit  => "features-fit",
            TrainingStage::ModelFit     => "model-fit",
            TrainingStage::Evaluated    => "evaluated",
            TrainingStage::Persisted    => "persisted",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ScorerError {
    /// No trained model on disk.
    #[error("model artifact not found at '{}' (run `train` first)", path.display())]
    ArtifactMissing { path: PathBuf },

    /// An artifact file exists but cannot be used.
    #[error("model artifact '{}' is corrupt: {reason}", path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    /// Another process holds the exclusive write lock.
    #[error("model store is locked by another training run ('{}')", path.display())]
    ArtifactLocked { path: PathBuf },

    /// The corpus cannot train a binary classifier.
    #[error("training data error: {0}")]
    TrainingData(String),

    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A training run aborted while attempting `stage`.
    #[error("training aborted at stage '{stage}': {source}")]
    Stage {
        stage: TrainingStage,
        #[source]
        source: Box<ScorerError>,
    },

    /// Failure inside the classifier backend.
    #[error("model error: {0}")]
    Model(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScorerError {
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        ScorerError::ArtifactCorrupt { path: path.into(), reason: reason.to_string() }
    }

    /// Tag an error with the training stage it interrupted.
    /// Errors that already carry a stage keep the original one.
    pub fn at_stage(self, stage: TrainingStage) -> Self {
        match self {
            err @ ScorerError::Stage { .. } => err,
            other => ScorerError::Stage { stage, source: Box::new(other) },
        }
    }

    /// Missing and corrupt artifacts both mean "inference unavailable".
    pub fn is_model_unavailable(&self) -> bool {
        matches!(
            self,
            ScorerError::ArtifactMissing { .. } | ScorerError::ArtifactCorrupt { .. }
        )
    }

    /// The training stage this error aborted, if any.
    pub fn stage(&self) -> Option<TrainingStage> {
        match self {
            ScorerError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScorerError>;
