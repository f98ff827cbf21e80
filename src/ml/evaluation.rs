// ============================================================
// Layer 5 — Evaluation Report
// ============================================================
// Scores held-out predictions against ground truth.
//
// A probability above 0.5 counts as a FAKE prediction for the
// purpose of evaluation only; scoring itself never thresholds.
//
// Per class:
//   precision = TP / (TP + FP)    (0 when the class is never predicted)
//   recall    = TP / (TP + FN)    (0 when the class never occurs)
//   f1        = harmonic mean of precision and recall
//   support   = number of true members of the class

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::document::Label;
use crate::error::{Result, ScorerError};

/// Probability cut-off used to turn P(FAKE) into a label for evaluation.
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label:     Label,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy:  f64,
    /// Indexed by `Label::index`: REAL first, FAKE second
    pub per_class: [ClassMetrics; 2],
    pub macro_f1:  f64,
    pub weighted_f1: f64,
    pub total:     usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl EvaluationReport {
    /// Compare true labels with predicted P(FAKE) values.
    pub fn compute(truth: &[Label], fake_proba: &[f64]) -> Result<Self> {
        if truth.is_empty() {
            return Err(ScorerError::Evaluation("evaluation split is empty".into()));
        }
        if truth.len() != fake_proba.len() {
            return Err(ScorerError::Evaluation(format!(
                "{} labels but {} predictions",
                truth.len(),
                fake_proba.len()
            )));
        }

        // confusion[true][predicted]
        let mut confusion = [[0usize; 2]; 2];
        for (label, &p) in truth.iter().zip(fake_proba) {
            let predicted = if p > DECISION_THRESHOLD { Label::Fake } else { Label::Real };
            confusion[label.index()][predicted.index()] += 1;
        }

        let class = |label: Label| {
            let i         = label.index();
            let tp        = confusion[i][i];
            let predicted = confusion[0][i] + confusion[1][i];
            let support   = confusion[i][0] + confusion[i][1];
            let precision = ratio(tp, predicted);
            let recall    = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics { label, precision, recall, f1, support }
        };
        let per_class = [class(Label::Real), class(Label::Fake)];

        let total       = truth.len();
        let accuracy    = ratio(confusion[0][0] + confusion[1][1], total);
        let macro_f1    = (per_class[0].f1 + per_class[1].f1) / 2.0;
        let weighted_f1 = per_class
            .iter()
            .map(|c| c.f1 * c.support as f64)
            .sum::<f64>()
            / total as f64;

        Ok(Self { accuracy, per_class, macro_f1, weighted_f1, total })
    }

    pub fn class(&self, label: Label) -> &ClassMetrics {
        &self.per_class[label.index()]
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>8} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for c in &self.per_class {
            writeln!(
                f,
                "{:>8} {:>9.4} {:>9.4} {:>9.4} {:>9}",
                c.label.to_string(), c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>8} {:>29.4} {:>9}", "accuracy", self.accuracy, self.total)?;
        writeln!(f, "{:>8} {:>29.4} {:>9}", "macro f1", self.macro_f1, self.total)?;
        write!(f, "{:>8} {:>29.4} {:>9}", "wtd f1", self.weighted_f1, self.total)
    }
}
