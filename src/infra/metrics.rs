// ============================================================
// Layer 6 — Training History Logger
// ============================================================
// Records the optimizer's progress to a CSV file, one row per
// epoch, so a slow or non-converging fit can be inspected
// after the fact.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - batch_loss: mean regularized loss over the epoch's mini-batches
//   - objective:  full training objective after the epoch
//                 (mean cross-entropy + L2 penalty)
//
// Output file: <run dir>/training_history.csv
//
//   epoch,batch_loss,objective
//   1,0.671203,0.652114
//   2,0.610877,0.589960
//
// Each training run starts a fresh file inside its own run
// directory, so the history always belongs to the live model.

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use csv::{Writer, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One row of optimizer progress for a single epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean loss over the mini-batches seen during the epoch
    pub batch_loss: f64,

    /// Full objective on the training split, evaluated after the epoch.
    /// Starts at ln 2 ≈ 0.693 for the all-zero model.
    pub objective: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, batch_loss: f64, objective: f64) -> Self {
        Self { epoch, batch_loss, objective }
    }

    /// Returns true if this epoch improved over the previous best objective
    pub fn is_improvement(&self, best_objective: f64) -> bool {
        self.objective < best_objective
    }
}

/// Writes epoch metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
    writer:   Writer<File>,
}

impl MetricsLogger {
    pub const FILE_NAME: &'static str = "training_history.csv";

    /// Create the directory if needed and start a fresh CSV with a header row.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path   = dir.join(Self::FILE_NAME);
        let mut writer = WriterBuilder::new().has_headers(false).from_path(&csv_path)?;
        writer.write_record(["epoch", "batch_loss", "objective"])?;
        writer.flush()?;
        tracing::debug!("Created training history CSV: '{}'", csv_path.display());

        Ok(Self { csv_path, writer })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&mut self, m: &EpochMetrics) -> Result<()> {
        self.writer.serialize(m)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Append every row of a finished history.
    pub fn log_all(&mut self, history: &[EpochMetrics]) -> Result<()> {
        history.iter().try_for_each(|m| self.log(m))
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 0.5, 0.3);
        assert!(m.is_improvement(0.4));
        assert!(!m.is_improvement(0.2));
    }

    #[test]
    fn test_csv_rows_written() {
        let dir        = tempfile::tempdir().unwrap();
        let mut logger = MetricsLogger::create(dir.path()).unwrap();
        logger
            .log_all(&[EpochMetrics::new(1, 0.7, 0.65), EpochMetrics::new(2, 0.6, 0.55)])
            .unwrap();

        let body = fs::read_to_string(logger.csv_path()).unwrap();
        let rows: Vec<&str> = body.lines().collect();
        assert_eq!(rows[0], "epoch,batch_loss,objective");
        assert_eq!(rows[2], "2,0.6,0.55");
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_rows_read_back_with_csv() {
        let dir     = tempfile::tempdir().unwrap();
        let history = [EpochMetrics::new(1, 0.693147, 0.61), EpochMetrics::new(2, 0.5, 0.45)];
        MetricsLogger::create(dir.path()).unwrap().log_all(&history).unwrap();

        let mut reader = csv::Reader::from_path(dir.path().join(MetricsLogger::FILE_NAME)).unwrap();
        let back: Vec<EpochMetrics> = reader.deserialize().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(back, history);
    }

    #[test]
    fn test_new_run_truncates_history() {
        let dir = tempfile::tempdir().unwrap();
        MetricsLogger::create(dir.path()).unwrap().log(&EpochMetrics::new(1, 1.0, 1.0)).unwrap();
        let logger = MetricsLogger::create(dir.path()).unwrap();
        let body   = fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(body.lines().count(), 1);
    }
}
