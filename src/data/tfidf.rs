// ============================================================
// Layer 4 — TF-IDF Feature Extractor
// ============================================================
// Fits a capped vocabulary on normalized training text and
// turns any text into a sparse, L2-normalized TF-IDF vector.
//
// Fitting (one shot, no partial fit):
//   1. Tokenize every document with the token pattern
//      (default: two or more word characters)
//   2. Count total occurrences and document frequency per term
//   3. Keep the `max_features` most frequent terms
//      (ties broken alphabetically), index them alphabetically
//   4. idf(t) = ln((1 + n) / (1 + df(t))) + 1
//
// Transforming:
//   weight(t) = count(t in doc) × idf(t), row scaled to unit L2 norm.
//   Tokens outside the vocabulary contribute nothing — unseen
//   words at inference time are expected, not an error.
//
// Every vector has dimension V = vocabulary size, even for "".

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScorerError};

/// Default token pattern: words of at least two characters.
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

// ─── SparseVector ─────────────────────────────────────────────────────────────
/// Sparse feature vector of fixed dimension.
/// `indices` are strictly increasing and parallel to `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dim:     usize,
    indices: Vec<usize>,
    values:  Vec<f64>,
}

impl SparseVector {
    /// All-zero vector of dimension `dim`.
    pub fn zeros(dim: usize) -> Self {
        Self { dim, indices: Vec::new(), values: Vec::new() }
    }

    /// Build from (index, value) pairs; pairs are sorted, indices must be < dim.
    pub fn from_pairs(dim: usize, mut pairs: Vec<(usize, f64)>) -> Self {
        pairs.sort_by_key(|&(i, _)| i);
        debug_assert!(pairs.iter().all(|&(i, _)| i < dim));
        let (indices, values) = pairs.into_iter().unzip();
        Self { dim, indices, values }
    }

    /// Dimensionality (vocabulary size), independent of sparsity.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored non-zero entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Dense copy with exactly `dim` entries.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for (i, v) in self.iter() {
            dense[i] = v;
        }
        dense
    }

    /// Write this row as f32 into a pre-zeroed dense buffer slice.
    pub fn scatter_into(&self, row: &mut [f32]) {
        for (i, v) in self.iter() {
            row[i] = v as f32;
        }
    }

    pub fn l2_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

// ─── TfidfConfig ──────────────────────────────────────────────────────────────
/// Hyperparameters for fitting the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfConfig {
    /// Maximum number of vocabulary terms kept
    pub max_features:  usize,

    /// Regex selecting tokens from normalized text
    pub token_pattern: String,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            max_features:  5000,
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
        }
    }
}

impl TfidfConfig {
    pub fn new(max_features: usize) -> Self {
        Self { max_features, ..Self::default() }
    }

    /// Fit a vectorizer on the (already normalized) training corpus.
    pub fn fit<S: AsRef<str>>(&self, corpus: &[S]) -> Result<TfidfVectorizer> {
        if self.max_features == 0 {
            return Err(ScorerError::TrainingData("max_features must be at least 1".into()));
        }
        let pattern = compile_pattern(&self.token_pattern)?;

        // ── Count term totals and document frequencies ───────────────────────
        // BTreeMap keeps terms alphabetical, which fixes tie-breaking below.
        let mut term_counts: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        for doc in corpus {
            let mut doc_counts: HashMap<&str, u64> = HashMap::new();
            for m in pattern.find_iter(doc.as_ref()) {
                *doc_counts.entry(m.as_str()).or_insert(0) += 1;
            }
            for (term, count) in doc_counts {
                let entry = term_counts.entry(term.to_string()).or_insert((0, 0));
                entry.0 += count;
                entry.1 += 1;
            }
        }

        if term_counts.is_empty() {
            return Err(ScorerError::TrainingData(
                "empty vocabulary; the training documents contain only stopwords or no text".into(),
            ));
        }

        // ── Keep the most frequent terms ──────────────────────────────────────
        // Stable sort on descending count keeps alphabetical order among ties.
        let mut ranked: Vec<(String, u64, u64)> = term_counts
            .into_iter()
            .map(|(term, (total, df))| (term, total, df))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(self.max_features);
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        // ── Assign indices and smoothed idf ──────────────────────────────────
        let n = corpus.len() as f64;
        let mut vocabulary = HashMap::with_capacity(ranked.len());
        let mut idf        = Vec::with_capacity(ranked.len());
        for (idx, (term, _total, df)) in ranked.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, idx);
        }

        tracing::debug!(
            "Fitted TF-IDF on {} documents: {} terms (cap {})",
            corpus.len(),
            vocabulary.len(),
            self.max_features
        );

        Ok(TfidfVectorizer {
            vocabulary,
            idf,
            n_documents:   corpus.len(),
            max_features:  self.max_features,
            token_pattern: self.token_pattern.clone(),
            pattern,
        })
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| ScorerError::TrainingData(format!("invalid token pattern '{pattern}': {e}")))
}

// ─── TfidfVectorizer ──────────────────────────────────────────────────────────
/// A fitted, frozen TF-IDF transform.
///
/// Serialized through `TfidfState`; the compiled regex is rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TfidfState", into = "TfidfState")]
pub struct TfidfVectorizer {
    vocabulary:    HashMap<String, usize>,
    idf:           Vec<f64>,
    n_documents:   usize,
    max_features:  usize,
    token_pattern: String,
    pattern:       Regex,
}

impl TfidfVectorizer {
    /// Vocabulary size V — the dimension of every output vector.
    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Number of training documents the IDF weights were computed from.
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.term_index(term).map(|i| self.idf[i])
    }

    /// Transform one normalized text.
    pub fn transform_one(&self, text: &str) -> SparseVector {
        let dim = self.vocabulary_size();

        let mut counts: HashMap<usize, f64> = HashMap::new();
        for m in self.pattern.find_iter(text) {
            if let Some(&idx) = self.vocabulary.get(m.as_str()) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let pairs: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx]))
            .collect();

        // Sorted before summing so the norm is bit-for-bit reproducible.
        let mut vector = SparseVector::from_pairs(dim, pairs);
        let norm = vector.l2_norm();
        if norm > 0.0 {
            for v in &mut vector.values {
                *v /= norm;
            }
        }
        vector
    }

    /// Transform a batch of normalized texts, preserving order.
    pub fn transform<S: AsRef<str>>(&self, texts: &[S]) -> Vec<SparseVector> {
        texts.iter().map(|t| self.transform_one(t.as_ref())).collect()
    }
}

/// On-disk shape of a fitted vectorizer.
#[derive(Serialize, Deserialize)]
struct TfidfState {
    vocabulary:    HashMap<String, usize>,
    idf:           Vec<f64>,
    n_documents:   usize,
    max_features:  usize,
    token_pattern: String,
}

impl From<TfidfVectorizer> for TfidfState {
    fn from(v: TfidfVectorizer) -> Self {
        Self {
            vocabulary:    v.vocabulary,
            idf:           v.idf,
            n_documents:   v.n_documents,
            max_features:  v.max_features,
            token_pattern: v.token_pattern,
        }
    }
}

impl TryFrom<TfidfState> for TfidfVectorizer {
    type Error = String;

    fn try_from(s: TfidfState) -> std::result::Result<Self, Self::Error> {
        if s.vocabulary.len() != s.idf.len() {
            return Err(format!(
                "vocabulary has {} terms but idf has {} weights",
                s.vocabulary.len(),
                s.idf.len()
            ));
        }
        if s.vocabulary.values().any(|&i| i >= s.idf.len()) {
            return Err("vocabulary index out of range".to_string());
        }
        let pattern = Regex::new(&s.token_pattern).map_err(|e| e.to_string())?;
        Ok(Self {
            vocabulary:    s.vocabulary,
            idf:           s.idf,
            n_documents:   s.n_documents,
            max_features:  s.max_features,
            token_pattern: s.token_pattern,
            pattern,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "official report budget".to_string(),
            "official report senate".to_string(),
            "shocking secret celebrity".to_string(),
            "shocking secret aliens aliens".to_string(),
        ]
    }

    #[test]
    fn test_dimension_is_fixed_for_any_input() {
        let v   = TfidfConfig::default().fit(&corpus()).unwrap();
        let dim = v.vocabulary_size();
        assert_eq!(dim, 8);
        for text in ["", "   ", "official", "never seen words", "aliens aliens aliens"] {
            let x = v.transform_one(text);
            assert_eq!(x.dim(), dim);
            assert_eq!(x.to_dense().len(), dim);
        }
    }

    #[test]
    fn test_out_of_vocabulary_tokens_dropped() {
        let v = TfidfConfig::default().fit(&corpus()).unwrap();
        let x = v.transform_one("completely unknown words");
        assert_eq!(x.nnz(), 0);
        assert_eq!(x.l2_norm(), 0.0);
    }

    #[test]
    fn test_rows_are_unit_length() {
        let v = TfidfConfig::default().fit(&corpus()).unwrap();
        let x = v.transform_one("shocking secret report");
        assert!((x.l2_norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_smoothed_idf() {
        let v = TfidfConfig::default().fit(&corpus()).unwrap();
        // "official" appears in 2 of 4 docs
        let expected = (5.0f64 / 3.0).ln() + 1.0;
        assert!((v.idf("official").unwrap() - expected).abs() < 1e-12);
        // "budget" appears in 1 of 4 docs, so it is rarer and weighs more
        assert!(v.idf("budget").unwrap() > v.idf("official").unwrap());
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let v = TfidfConfig::new(3).fit(&corpus()).unwrap();
        assert_eq!(v.vocabulary_size(), 3);
        // five terms occur twice; ties keep the alphabetically first ones
        assert!(v.term_index("aliens").is_some());
        assert!(v.term_index("official").is_some());
        assert!(v.term_index("report").is_some());
        assert!(v.term_index("shocking").is_none());
    }

    #[test]
    fn test_vocabulary_indexed_alphabetically() {
        let v = TfidfConfig::default().fit(&corpus()).unwrap();
        assert_eq!(v.term_index("aliens"), Some(0));
        assert_eq!(v.term_index("shocking"), Some(v.vocabulary_size() - 1));
    }

    #[test]
    fn test_single_character_tokens_ignored() {
        let v = TfidfConfig::default().fit(&["a b c word".to_string()]).unwrap();
        assert_eq!(v.vocabulary_size(), 1);
    }

    #[test]
    fn test_empty_vocabulary_is_training_error() {
        let err = TfidfConfig::default().fit(&["".to_string(), "x".to_string()]).unwrap_err();
        assert!(matches!(err, ScorerError::TrainingData(_)));
    }

    #[test]
    fn test_serde_round_trip_keeps_transform() {
        let v     = TfidfConfig::default().fit(&corpus()).unwrap();
        let json  = serde_json::to_string(&v).unwrap();
        let back: TfidfVectorizer = serde_json::from_str(&json).unwrap();
        let text  = "official secret aliens";
        assert_eq!(v.transform_one(text), back.transform_one(text));
    }
}
