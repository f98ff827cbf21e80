// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that runs tensors lives here. The data layer only
// hands over Burn datasets and batchers; nothing above this
// layer builds a tensor.
//
// What's in this layer:
//
//   model.rs      — L2-regularized logistic regression
//                   • Linear layer, one output, zero init
//                   • Sigmoid probability of FAKE
//                   • Numerically stable cross-entropy
//
//   trainer.rs    — The training loop
//                   Seeded mini-batch Adam, full objective per
//                   epoch, best-iterate selection
//
//   classifier.rs — The fitted, frozen model
//                   Batch P(FAKE) prediction and exact weight
//                   round-trip for the model store
//
//   evaluation.rs — Held-out accuracy, precision, recall, F1
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Logistic regression module
pub mod model;

/// Training loop with convergence check
pub mod trainer;

/// Fitted classifier used for inference
pub mod classifier;

/// Evaluation metrics on the held-out split
pub mod evaluation;
