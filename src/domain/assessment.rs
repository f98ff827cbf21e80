// ============================================================
// Layer 3 — Prediction and Assessment Types
// ============================================================
// Prediction   — the classifier signal for one piece of text
// ClaimVerdict — the fact-check signal for the same text
// Assessment   — both signals side by side
//
// Neither signal is thresholded into a verdict here.
// Deciding what counts as "misinformation" is the caller's job.

use serde::{Deserialize, Serialize};

/// FAKE-class probability for one query. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// P(FAKE) in [0, 1]
    pub fake_probability: f64,

    /// Set when the query normalized to nothing. The model still
    /// produces a probability, but it only reflects the intercept.
    pub low_confidence: bool,
}

impl Prediction {
    pub fn new(fake_probability: f64, low_confidence: bool) -> Self {
        Self { fake_probability, low_confidence }
    }

    pub fn real_probability(&self) -> f64 {
        1.0 - self.fake_probability
    }

    /// P(FAKE) scaled to 0–100 for display.
    pub fn fake_percent(&self) -> f64 {
        self.fake_probability * 100.0
    }
}

/// Outcome of a third-party fact-check lookup.
///
/// "Nothing matched" and "the lookup itself broke" are different
/// outcomes and are kept apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimVerdict {
    /// A reviewer rated a matching claim.
    Rated { publisher: String, rating: String },

    /// The lookup succeeded but no reviewed claim matched.
    NoClaimFound,

    /// The lookup could not be completed.
    LookupFailed { reason: String },
}

impl ClaimVerdict {
    /// Human-readable summary, e.g. "According to Snopes that claim is False".
    pub fn summary(&self) -> String {
        match self {
            ClaimVerdict::Rated { publisher, rating } => {
                format!("According to {publisher} that claim is {rating}")
            }
            ClaimVerdict::NoClaimFound => "No matching claims were found.".to_string(),
            ClaimVerdict::LookupFailed { reason } => format!("Fact-check lookup failed: {reason}"),
        }
    }
}

/// Both signals for one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub claim:      ClaimVerdict,
    pub prediction: Prediction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_scaling() {
        let p = Prediction::new(0.25, false);
        assert!((p.fake_percent() - 25.0).abs() < 1e-12);
        assert!((p.real_probability() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_verdict_summaries_are_distinct() {
        let rated = ClaimVerdict::Rated {
            publisher: "PolitiFact".into(),
            rating:    "False".into(),
        };
        assert_eq!(rated.summary(), "According to PolitiFact that claim is False");
        assert_ne!(
            ClaimVerdict::NoClaimFound.summary(),
            ClaimVerdict::LookupFailed { reason: "timeout".into() }.summary()
        );
    }
}
