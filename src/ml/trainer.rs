// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Fits the L2-regularized logistic model with Burn's DataLoader
// and Adam, on the CPU NdArray backend.
//
// Objective (per-sample form of the usual C-regularized loss):
//   J(w, b) = mean BCE(x·w + b, y) + ‖w‖² / (2·C·n)
//
// Per epoch:
//   1. Shuffled mini-batches (seeded) → Adam steps
//   2. Full objective on the training split with the
//      inner-backend model (no autodiff overhead)
//   3. Keep the best iterate; stop once the objective
//      improves by less than `tol` (relative)
//
// Hitting `max_iter` is not an error: a warning is logged and
// the best iterate seen so far is returned.
//
// Key Burn insight:
//   - Training uses TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on NdArray
//   - The objective loader must therefore use the inner backend

use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::ElementConversion,
};
use serde::{Deserialize, Serialize};

use crate::data::{batcher::ArticleBatcher, dataset::ArticleDataset};
use crate::error::{Result, ScorerError};
use crate::infra::metrics::EpochMetrics;
use crate::ml::classifier::FittedClassifier;
use crate::ml::model::{LogisticRegression, LogisticRegressionConfig};

type TrainBackend = Autodiff<NdArray>;
type InnerBackend = NdArray;

// ─── Classifier Configuration ────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Inverse regularization strength (larger = weaker L2)
    pub c:             f64,
    /// Maximum number of epochs
    pub max_iter:      usize,
    /// Relative objective improvement below which training stops
    pub tol:           f64,
    pub learning_rate: f64,
    pub batch_size:    usize,
    /// Seed for mini-batch shuffling
    pub seed:          u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            c:             1.0,
            max_iter:      100,
            tol:           1e-4,
            learning_rate: 0.05,
            batch_size:    64,
            seed:          42,
        }
    }
}

/// Result of one fit: the best iterate plus how we got there.
#[derive(Debug)]
pub struct FitOutcome {
    pub classifier: FittedClassifier,
    pub history:    Vec<EpochMetrics>,
    pub converged:  bool,
    pub best_epoch: usize,
}

impl FitOutcome {
    pub fn best_objective(&self) -> Option<f64> {
        self.history
            .iter()
            .find(|m| m.epoch == self.best_epoch)
            .map(|m| m.objective)
    }
}

/// Fit a classifier on vectorized samples of width `n_features`.
pub fn fit_classifier(
    cfg:        &ClassifierConfig,
    dataset:    ArticleDataset,
    n_features: usize,
) -> Result<FitOutcome> {
    validate(cfg, &dataset, n_features)?;

    let device = NdArrayDevice::default();
    let n      = dataset.sample_count();
    let l2     = 1.0 / (cfg.c * n as f64);

    // ── Build zero-initialized model ─────────────────────────────────────────
    let mut model: LogisticRegression<TrainBackend> =
        LogisticRegressionConfig::new(n_features).init(&device);
    tracing::info!(
        "Fitting logistic regression: {} samples, {} features, C={}, max_iter={}",
        n, n_features, cfg.c, cfg.max_iter
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── Shuffled training loader (autodiff backend) ──────────────────────────
    let train_loader = DataLoaderBuilder::new(ArticleBatcher::<TrainBackend>::new(device, n_features))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .build(dataset.clone());

    // ── Ordered objective loader (inner backend) ─────────────────────────────
    let objective_loader = DataLoaderBuilder::new(ArticleBatcher::<InnerBackend>::new(device, n_features))
        .batch_size(cfg.batch_size)
        .build(dataset);

    let mut history    = Vec::with_capacity(cfg.max_iter);
    let mut best_model = model.valid();
    let mut best_obj   = f64::INFINITY;
    let mut best_epoch = 0usize;
    let mut converged  = false;

    for epoch in 1..=cfg.max_iter {
        // ── Training phase ────────────────────────────────────────────────────
        let mut batch_loss_sum = 0.0f64;
        let mut batches        = 0usize;

        for batch in train_loader.iter() {
            let loss = model.objective(batch.features, batch.targets, l2);
            batch_loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches        += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }
        let batch_loss = if batches > 0 { batch_loss_sum / batches as f64 } else { f64::NAN };

        // ── Full objective on the current iterate ─────────────────────────────
        let current   = model.valid();
        let objective = full_objective(&current, objective_loader.iter(), n, l2);

        let metrics = EpochMetrics::new(epoch, batch_loss, objective);
        tracing::debug!(
            "Epoch {:>3}/{} | batch_loss={:.6} | objective={:.6}",
            epoch, cfg.max_iter, batch_loss, objective
        );

        if !objective.is_finite() {
            return Err(ScorerError::Model(format!(
                "objective diverged at epoch {epoch}; try a smaller learning rate"
            )));
        }

        let previous = best_obj;
        if metrics.is_improvement(best_obj) {
            best_obj   = objective;
            best_model = current;
            best_epoch = epoch;
        }
        history.push(metrics);

        if previous.is_finite() && (previous - objective).abs() <= cfg.tol * previous.abs().max(1.0) {
            converged = true;
            tracing::info!("Converged after {} epochs (objective {:.6})", epoch, best_obj);
            break;
        }
    }

    if !converged {
        tracing::warn!(
            "Logistic regression did not converge within {} epochs; using best iterate from epoch {} (objective {:.6})",
            cfg.max_iter, best_epoch, best_obj
        );
    }

    Ok(FitOutcome {
        classifier: FittedClassifier::new(best_model),
        history,
        converged,
        best_epoch,
    })
}

/// Mean cross-entropy over every sample plus the L2 term.
fn full_objective<I>(
    model:   &LogisticRegression<InnerBackend>,
    batches: I,
    n:       usize,
    l2:      f64,
) -> f64
where
    I: Iterator<Item = crate::data::batcher::ArticleBatch<InnerBackend>>,
{
    let mut loss_sum = 0.0f64;
    for batch in batches {
        let rows   = batch.targets.dims()[0] as f64;
        let logits = model.forward(batch.features);
        let mean: f64 = model.data_loss(logits, batch.targets).into_scalar().elem();
        loss_sum += mean * rows;
    }
    let penalty: f64 = model.squared_weight_norm().into_scalar().elem();
    loss_sum / n as f64 + l2 / 2.0 * penalty
}

fn validate(cfg: &ClassifierConfig, dataset: &ArticleDataset, n_features: usize) -> Result<()> {
    if dataset.sample_count() == 0 {
        return Err(ScorerError::TrainingData("training split is empty".into()));
    }
    let counts = dataset.class_counts();
    if counts.iter().any(|&c| c == 0) {
        return Err(ScorerError::TrainingData(format!(
            "training split has {} REAL and {} FAKE samples; need both classes",
            counts[0], counts[1]
        )));
    }
    if n_features == 0 {
        return Err(ScorerError::TrainingData("feature space is empty".into()));
    }
    if cfg.max_iter == 0 || cfg.batch_size == 0 {
        return Err(ScorerError::TrainingData("max_iter and batch_size must be at least 1".into()));
    }
    if !(cfg.c > 0.0) || !(cfg.learning_rate > 0.0) {
        return Err(ScorerError::TrainingData("C and learning rate must be positive".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::ArticleSample;
    use crate::data::tfidf::SparseVector;
    use crate::domain::document::Label;

    /// Feature 0 fires for REAL, feature 1 for FAKE.
    fn toy_dataset(per_class: usize) -> ArticleDataset {
        let mut samples = Vec::new();
        for _ in 0..per_class {
            samples.push(ArticleSample::new(SparseVector::from_pairs(3, vec![(0, 1.0)]), Label::Real));
            samples.push(ArticleSample::new(SparseVector::from_pairs(3, vec![(1, 1.0)]), Label::Fake));
        }
        ArticleDataset::new(samples)
    }

    fn quick_cfg() -> ClassifierConfig {
        ClassifierConfig { max_iter: 40, batch_size: 8, learning_rate: 0.1, ..Default::default() }
    }

    #[test]
    fn test_learns_separable_toy_problem() {
        let out = fit_classifier(&quick_cfg(), toy_dataset(20), 3).unwrap();
        let p   = out
            .classifier
            .predict_fake_proba(&[
                SparseVector::from_pairs(3, vec![(0, 1.0)]),
                SparseVector::from_pairs(3, vec![(1, 1.0)]),
            ])
            .unwrap();
        assert!(p[0] < 0.5, "REAL feature scored {}", p[0]);
        assert!(p[1] > 0.5, "FAKE feature scored {}", p[1]);
    }

    #[test]
    fn test_objective_drops_below_ln2() {
        let out = fit_classifier(&quick_cfg(), toy_dataset(20), 3).unwrap();
        assert!(out.best_objective().unwrap() < std::f64::consts::LN_2);
        assert!(out.history.len() <= 40);
        assert!(out.best_epoch >= 1);
    }

    #[test]
    fn test_iteration_cap_is_not_fatal() {
        let cfg = ClassifierConfig { max_iter: 1, tol: 0.0, ..quick_cfg() };
        let out = fit_classifier(&cfg, toy_dataset(5), 3).unwrap();
        assert!(!out.converged);
        assert_eq!(out.history.len(), 1);
        assert_eq!(out.best_epoch, 1);
    }

    #[test]
    fn test_same_seed_same_weights() {
        let a = fit_classifier(&quick_cfg(), toy_dataset(10), 3).unwrap();
        let b = fit_classifier(&quick_cfg(), toy_dataset(10), 3).unwrap();
        assert_eq!(a.classifier.weights().unwrap(), b.classifier.weights().unwrap());

        let rows = [
            SparseVector::from_pairs(3, vec![(0, 0.6), (2, 0.8)]),
            SparseVector::from_pairs(3, vec![(1, 1.0)]),
        ];
        assert_eq!(
            a.classifier.predict_fake_proba(&rows).unwrap(),
            b.classifier.predict_fake_proba(&rows).unwrap()
        );
    }

    #[test]
    fn test_single_class_rejected() {
        let samples = vec![ArticleSample::new(SparseVector::zeros(2), Label::Fake); 4];
        let err     = fit_classifier(&quick_cfg(), ArticleDataset::new(samples), 2).unwrap_err();
        assert!(matches!(err, ScorerError::TrainingData(_)));
    }
}
