// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence concerns shared by training and scoring:
//
//   model_store.rs — Saving and loading the model artifact
//                    Two bincode files (extractor, classifier)
//                    stamped with one run id, written atomically
//                    under an exclusive lock. Also saves the
//                    TrainConfig and evaluation report as JSON.
//
//   metrics.rs     — Training history logging
//                    Writes per-epoch loss and objective to a
//                    CSV file for later inspection.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)

/// Model artifact persistence
pub mod model_store;

/// Training history CSV logger
pub mod metrics;
