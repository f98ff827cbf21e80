// ============================================================
// misinfo-scorer
// ============================================================
// Fake-news text classifier: TF-IDF features over normalized
// article text, scored by an L2-regularized logistic regression.
//
//   cli          Layer 1 — clap commands (used by the binary)
//   application  Layer 2 — train and score use cases
//   domain       Layer 3 — documents, predictions, seams
//   data         Layer 4 — loading, normalizing, TF-IDF
//   ml           Layer 5 — model, trainer, evaluation
//   infra        Layer 6 — model store, training history

#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ml;
