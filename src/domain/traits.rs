// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between layers:
//
//   CorpusSource  — anything that yields labelled documents
//                   (CsvCorpusLoader reads the REAL/FAKE CSVs,
//                   a Vec<Document> serves in-memory corpora)
//   ClaimLookup   — the external fact-check service, which this
//                   crate never talks to directly
//
// Programming against these keeps the training and scoring
// workflows testable without files or network access.

use crate::domain::assessment::ClaimVerdict;
use crate::domain::document::{Corpus, Document};
use crate::error::Result;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can load a labelled corpus.
pub trait CorpusSource {
    /// Load every usable document, each already tagged with its label.
    fn load_all(&self) -> Result<Corpus>;
}

impl CorpusSource for Vec<Document> {
    fn load_all(&self) -> Result<Corpus> {
        Ok(Corpus::from_documents(self.clone()))
    }
}

// ─── ClaimLookup ──────────────────────────────────────────────────────────────
/// A third-party fact-check database.
///
/// Implementations must never fold a failed request into
/// `NoClaimFound`; failures are `LookupFailed`.
pub trait ClaimLookup {
    fn lookup(&self, query: &str) -> ClaimVerdict;
}
