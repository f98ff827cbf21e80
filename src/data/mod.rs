// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the CSV files on disk and the tensor
// batches the classifier trains on:
//
//   True.csv / Fake.csv
//       │
//       ▼
//   CsvCorpusLoader   → labelled Documents
//       │
//       ▼
//   TextNormalizer    → lowercase, no punctuation, no stopwords
//       │
//       ▼
//   split_train_eval  → seeded 80/20 split
//       │
//       ▼
//   TfidfVectorizer   → sparse feature vectors (fit on train only)
//       │
//       ▼
//   ArticleDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   ArticleBatcher    → dense tensor mini-batches
//
// The normalizer and vectorizer are also used, unchanged,
// at inference time.

/// Loads the REAL/FAKE CSV corpora
pub mod loader;

/// Lowercase / punctuation / stopword normalization
pub mod normalizer;

/// TF-IDF vocabulary fitting and sparse vectors
pub mod tfidf;

/// Seeded shuffle and train/evaluation split
pub mod splitter;

/// Implements Burn's Dataset trait for article samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
