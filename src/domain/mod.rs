// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what the
// system talks about: articles, labels, predictions and
// fact-check verdicts.
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O or network calls
//   - Only data and the traits other layers implement

// A news article and its REAL/FAKE label
pub mod document;

// Prediction, fact-check verdict and the combined assessment
pub mod assessment;

// Core abstractions (traits) that other layers implement
pub mod traits;
