// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads the two labelled news corpora from CSV files using
// the `csv` crate:
//
//   True.csv  → every row labelled REAL
//   Fake.csv  → every row labelled FAKE
//
// Each file needs a header row with at least `title` and
// `text` columns; any other columns (subject, date, ...) are
// ignored. Rows whose `text` is missing or blank are skipped
// and counted, malformed rows are skipped with a warning —
// one bad row must not sink a 40k-row corpus.
//
// Documents are tagged with their label here, before any
// shuffling or splitting happens downstream.

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use serde::Deserialize;

use crate::domain::document::{Corpus, Document, Label, LoadStats};
use crate::domain::traits::CorpusSource;
use crate::error::{Result, ScorerError};

/// One CSV row. Only the columns we care about are declared.
#[derive(Debug, Deserialize)]
struct ArticleRow {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text:  Option<String>,
}

/// Loads the REAL and FAKE CSV files into one labelled corpus.
#[derive(Debug, Clone)]
pub struct CsvCorpusLoader {
    real_path: PathBuf,
    fake_path: PathBuf,

    /// Prepend the headline to the body text
    include_title: bool,
}

impl CsvCorpusLoader {
    pub fn new(real_path: impl Into<PathBuf>, fake_path: impl Into<PathBuf>) -> Self {
        Self {
            real_path:     real_path.into(),
            fake_path:     fake_path.into(),
            include_title: false,
        }
    }

    pub fn with_title(mut self, include_title: bool) -> Self {
        self.include_title = include_title;
        self
    }

    fn load_file(&self, path: &Path, label: Label, out: &mut Vec<Document>) -> Result<LoadStats> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::None)
            .from_path(path)?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("corpus")
            .to_string();

        let mut stats = LoadStats::default();
        for (row_no, record) in reader.deserialize::<ArticleRow>().enumerate() {
            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("Skipping malformed row {} in '{}': {}", row_no + 1, path.display(), e);
                    stats.malformed += 1;
                    continue;
                }
            };

            let Some(text) = row.text.filter(|t| !t.trim().is_empty()) else {
                stats.no_text += 1;
                continue;
            };

            let text = match (&row.title, self.include_title) {
                (Some(title), true) if !title.trim().is_empty() => format!("{title} {text}"),
                _ => text,
            };

            out.push(Document::labelled(format!("{file_name}:{}", row_no + 1), text, label));
            stats.loaded += 1;
        }

        Ok(stats)
    }
}

impl CorpusSource for CsvCorpusLoader {
    /// Load both files, REAL first, counting the rows that were skipped.
    fn load_all(&self) -> Result<Corpus> {
        let mut corpus = Corpus::default();

        for (path, label) in [(&self.real_path, Label::Real), (&self.fake_path, Label::Fake)] {
            let file_stats = self.load_file(path, label, &mut corpus.documents)?;
            tracing::info!(
                "Loaded {} {} documents from '{}' ({} skipped)",
                file_stats.loaded,
                label,
                path.display(),
                file_stats.skipped()
            );
            corpus.stats.merge(file_stats);
        }

        Ok(corpus)
    }
}

/// Fail unless every document is labelled and both labels occur.
pub fn ensure_both_labels(docs: &[Document], what: &str) -> Result<()> {
    if docs.is_empty() {
        return Err(ScorerError::TrainingData(format!("{what} is empty")));
    }
    if let Some(doc) = docs.iter().find(|d| d.label().is_none()) {
        return Err(ScorerError::TrainingData(format!(
            "{what} contains unlabelled document '{}'",
            doc.source()
        )));
    }
    for label in Label::all() {
        if !docs.iter().any(|d| d.label() == Some(label)) {
            return Err(ScorerError::TrainingData(format!(
                "{what} contains no {label} documents; need both classes"
            )));
        }
    }
    Ok(())
}
