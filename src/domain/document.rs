// ============================================================
// Layer 3 — Document Domain Type
// ============================================================
// A single news article, either labelled (training corpus)
// or unlabelled (a query at inference time), and the corpus
// a CorpusSource hands to the trainer.
//
// Documents are immutable: fields are private and only
// exposed through accessors, so nothing downstream can
// rewrite the raw text that audits refer back to.
//
// Label encoding is fixed for the whole system:
//   REAL ↦ 0
//   FAKE ↦ 1
// The classifier's probability always means P(FAKE).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ground-truth class of a news article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Real,
    Fake,
}

impl Label {
    /// Numeric class index: REAL = 0, FAKE = 1.
    pub fn index(self) -> usize {
        match self {
            Label::Real => 0,
            Label::Fake => 1,
        }
    }

    /// Regression target for the logistic model.
    pub fn target(self) -> f32 {
        self.index() as f32
    }

    /// Both labels in class-index order.
    pub fn all() -> [Label; 2] {
        [Label::Real, Label::Fake]
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Real => f.write_str("REAL"),
            Label::Fake => f.write_str("FAKE"),
        }
    }
}

/// A news article as loaded from the corpus or received as a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Where the document came from, e.g. "True.csv:17"
    source: String,

    /// Text the classifier sees (body, or title + body)
    text: String,

    /// Only present for training documents
    label: Option<Label>,
}

impl Document {
    /// A labelled training document.
    pub fn labelled(source: impl Into<String>, text: impl Into<String>, label: Label) -> Self {
        Self {
            source: source.into(),
            text:   text.into(),
            label:  Some(label),
        }
    }

    /// An unlabelled query document.
    pub fn query(text: impl Into<String>) -> Self {
        Self {
            source: "query".to_string(),
            text:   text.into(),
            label:  None,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn label(&self) -> Option<Label> {
        self.label
    }
}

// ─── Corpus ───────────────────────────────────────────────────────────────────
/// Row counters from one corpus load, reported in the training summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub loaded:    usize,
    pub no_text:   usize,
    pub malformed: usize,
}

impl LoadStats {
    pub fn skipped(&self) -> usize {
        self.no_text + self.malformed
    }

    pub fn merge(&mut self, other: LoadStats) {
        self.loaded    += other.loaded;
        self.no_text   += other.no_text;
        self.malformed += other.malformed;
    }
}

/// Everything a corpus source produced: the documents and what was dropped.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<Document>,
    pub stats:     LoadStats,
}

impl Corpus {
    /// A corpus with nothing skipped.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let stats = LoadStats { loaded: documents.len(), ..LoadStats::default() };
        Self { documents, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_encoding_is_fixed() {
        assert_eq!(Label::Real.index(), 0);
        assert_eq!(Label::Fake.index(), 1);
        assert_eq!(Label::Fake.target(), 1.0);
        assert_eq!(Label::all(), [Label::Real, Label::Fake]);
    }

    #[test]
    fn test_query_has_no_label() {
        let doc = Document::query("some text");
        assert_eq!(doc.label(), None);
        assert_eq!(doc.text(), "some text");
    }

    #[test]
    fn test_load_stats_merge() {
        let mut total = LoadStats { loaded: 3, no_text: 1, malformed: 0 };
        total.merge(LoadStats { loaded: 2, no_text: 0, malformed: 2 });
        assert_eq!(total, LoadStats { loaded: 5, no_text: 1, malformed: 2 });
        assert_eq!(total.skipped(), 3);
    }

    #[test]
    fn test_in_memory_corpus_counts_everything_loaded() {
        let corpus = Corpus::from_documents(vec![
            Document::labelled("a", "x", Label::Real),
            Document::labelled("b", "y", Label::Fake),
        ]);
        assert_eq!(corpus.stats.loaded, 2);
        assert_eq!(corpus.stats.skipped(), 0);
    }
}
