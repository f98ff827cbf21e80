// ============================================================
// Layer 4 — Text Normalizer
// ============================================================
// Turns raw article text into the token string that the
// TF-IDF extractor sees. Training and inference MUST go
// through this exact transform or the feature space drifts.
//
// Steps (applied in order):
//   1. Lowercase every character
//   2. Drop every ASCII punctuation character
//        !"#$%&'()*+,-./:;<=>?@[\]^_`{|}~
//   3. Split on whitespace
//   4. Drop tokens found in the English stopword list
//   5. Re-join survivors with single spaces
//
// Example:
//   "The Cat, sat."  →  "cat sat"
//
// The stopword list ships inside the binary
// (resources/stopwords_en.txt) so normalization never
// needs the network and is reproducible byte for byte.

use std::collections::HashSet;

/// Embedded stopword resource. Lines starting with '#' are comments.
const STOPWORDS_EN: &str = include_str!("resources/stopwords_en.txt");

/// Version of the embedded stopword resource.
pub const STOPWORDS_VERSION: u32 = 1;

/// Deterministic lowercase / punctuation / stopword normalizer.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stopwords: HashSet<&'static str>,
}

impl TextNormalizer {
    /// Create a normalizer backed by the embedded English stopword list
    pub fn new() -> Self {
        let stopwords = STOPWORDS_EN
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        Self { stopwords }
    }

    /// Normalize one text. Pure: no I/O, no failure modes.
    pub fn normalize(&self, text: &str) -> String {
        // ── Steps 1 + 2: lowercase and strip punctuation in one pass ─────────
        let mut cleaned = String::with_capacity(text.len());
        for c in text.chars() {
            if c.is_ascii_punctuation() {
                continue;
            }
            cleaned.extend(c.to_lowercase());
        }

        // ── Steps 3–5: drop stopwords, re-join with single spaces ────────────
        cleaned
            .split_whitespace()
            .filter(|token| !self.is_stopword(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Normalize a batch, preserving order.
    pub fn normalize_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        texts.iter().map(|t| self.normalize(t.as_ref())).collect()
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    pub fn stopword_count(&self) -> usize {
        self.stopwords.len()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
