// ============================================================
// Layer 2 — ScoreUseCase
// ============================================================
// Turns a piece of text into a FAKE probability:
//
//   Step 1: Get the model artifact      (ModelHandle)
//   Step 2: Normalize the query         (Layer 4 - data)
//   Step 3: TF-IDF transform            (Layer 4 - data)
//   Step 4: Logistic P(FAKE)            (Layer 5 - ml)
//
// The artifact is either handed in directly or loaded from the
// model store on first use and cached for the handle's lifetime.
// A failed load is not cached, so training a model later makes
// the next call succeed.
//
// No thresholding happens here: the caller gets a probability.

use std::sync::{Arc, OnceLock};

use crate::data::normalizer::TextNormalizer;
use crate::domain::assessment::{Assessment, Prediction};
use crate::domain::document::Document;
use crate::domain::traits::ClaimLookup;
use crate::error::{Result, ScorerError};
use crate::infra::model_store::{ModelArtifact, ModelStore};

// ─── ModelHandle ──────────────────────────────────────────────────────────────
enum HandleSource {
    Injected(Arc<ModelArtifact>),
    Lazy {
        store:  ModelStore,
        loaded: OnceLock<Arc<ModelArtifact>>,
    },
}

/// Access to the fitted model, injected or loaded once on demand.
pub struct ModelHandle {
    source: HandleSource,
}

impl ModelHandle {
    pub fn injected(artifact: Arc<ModelArtifact>) -> Self {
        Self { source: HandleSource::Injected(artifact) }
    }

    /// Load from `store` the first time `artifact()` is called.
    pub fn lazy(store: ModelStore) -> Self {
        Self { source: HandleSource::Lazy { store, loaded: OnceLock::new() } }
    }

    pub fn is_loaded(&self) -> bool {
        match &self.source {
            HandleSource::Injected(_)          => true,
            HandleSource::Lazy { loaded, .. } => loaded.get().is_some(),
        }
    }

    /// The artifact, loading it if this is the first successful call.
    pub fn artifact(&self) -> Result<Arc<ModelArtifact>> {
        match &self.source {
            HandleSource::Injected(artifact) => Ok(Arc::clone(artifact)),
            HandleSource::Lazy { store, loaded } => {
                if let Some(artifact) = loaded.get() {
                    return Ok(Arc::clone(artifact));
                }
                let fresh = Arc::new(store.load()?);
                tracing::info!(
                    "Loaded model (run {}) from '{}'",
                    fresh.run_id(),
                    store.dir().display()
                );
                Ok(Arc::clone(loaded.get_or_init(|| fresh)))
            }
        }
    }
}

// ─── ScoreUseCase ─────────────────────────────────────────────────────────────
pub struct ScoreUseCase {
    normalizer: TextNormalizer,
    handle:     ModelHandle,
}

impl ScoreUseCase {
    pub fn new(handle: ModelHandle) -> Self {
        Self { normalizer: TextNormalizer::new(), handle }
    }

    /// Convenience constructor reading from a model directory.
    pub fn from_model_dir(dir: impl Into<std::path::PathBuf>) -> Self {
        Self::new(ModelHandle::lazy(ModelStore::new(dir)))
    }

    pub fn handle(&self) -> &ModelHandle {
        &self.handle
    }

    /// P(FAKE) in [0, 1] for one query.
    pub fn score(&self, text: &str) -> Result<f64> {
        self.predict(text).map(|p| p.fake_probability)
    }

    /// P(FAKE) plus a low-confidence flag for queries with no content words.
    pub fn predict(&self, text: &str) -> Result<Prediction> {
        let artifact   = self.handle.artifact()?;
        let query      = Document::query(text);
        let normalized = self.normalizer.normalize(query.text());
        let low_confidence = normalized.is_empty();
        if low_confidence {
            tracing::debug!("Query normalized to an empty string; scoring intercept only");
        }

        let proba = artifact.predict_fake_proba(&[normalized])?;
        let p     = proba
            .first()
            .copied()
            .ok_or_else(|| ScorerError::Model("classifier returned no probability".into()))?;
        Ok(Prediction::new(p, low_confidence))
    }

    /// Combine a fact-check lookup with the classifier score.
    pub fn assess(&self, text: &str, lookup: &dyn ClaimLookup) -> Result<Assessment> {
        let prediction = self.predict(text)?;
        let claim      = lookup.lookup(text);
        Ok(Assessment { claim, prediction })
    }
}
