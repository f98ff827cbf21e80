// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline as a one-way state
// machine:
//
//   Idle
//    → CorpusLoaded  any CorpusSource          (Layer 3/4)
//    → Normalized    lowercase / punct / stop  (Layer 4 - data)
//    → FeaturesFit   seeded split, TF-IDF fit  (Layer 4 - data)
//    → ModelFit      logistic regression       (Layer 5 - ml)
//    → Evaluated     held-out metrics          (Layer 5 - ml)
//    → Persisted     artifact + JSON + CSV     (Layer 6 - infra)
//
// A failure in any stage except Evaluated aborts the run with
// that stage named, and the previously saved model stays live.
// An evaluation failure (e.g. an empty evaluation split) is
// logged and the fitted model is persisted anyway, without an
// evaluation.json.
//
// Everything a run persists lands in its own run directory and
// becomes visible in one atomic switch (see ModelStore).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{ArticleDataset, ArticleSample},
    loader::{ensure_both_labels, CsvCorpusLoader},
    normalizer::TextNormalizer,
    splitter::{split_train_eval, DEFAULT_SEED},
    tfidf::TfidfConfig,
};
use crate::domain::document::{Corpus, Document, Label, LoadStats};
use crate::domain::traits::CorpusSource;
use crate::error::{Result, ScorerError, TrainingStage};
use crate::infra::{
    metrics::{EpochMetrics, MetricsLogger},
    model_store::{ModelArtifact, ModelStore, CONFIG_FILE, EVALUATION_FILE},
};
use crate::ml::{
    evaluation::EvaluationReport,
    trainer::{fit_classifier, ClassifierConfig, FitOutcome},
};

/// How many evaluation documents are echoed in the report.
const SAMPLE_PREDICTIONS: usize = 5;

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything that determines a training run. Saved next to the
// artifact as train_config.json so a model can be traced back
// to the settings that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub real_csv:      String,
    pub fake_csv:      String,
    pub model_dir:     String,
    pub include_title: bool,
    pub eval_fraction: f64,
    /// Seed for the train/evaluation split
    pub seed:          u64,
    pub features:      TfidfConfig,
    pub classifier:    ClassifierConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            real_csv:      "data/True.csv".to_string(),
            fake_csv:      "data/Fake.csv".to_string(),
            model_dir:     "models".to_string(),
            include_title: false,
            eval_fraction: 0.2,
            seed:          DEFAULT_SEED,
            features:      TfidfConfig::default(),
            classifier:    ClassifierConfig::default(),
        }
    }
}

// ─── Training Report ─────────────────────────────────────────────────────────
/// One held-out document and what the fresh model made of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplePrediction {
    pub source:        String,
    pub label:         Label,
    /// [P(REAL), P(FAKE)]
    pub probabilities: [f64; 2],
}

/// Summary of a finished training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub run_id:          String,
    pub model_dir:       PathBuf,
    /// Where this run's files were written
    pub run_dir:         PathBuf,
    pub load_stats:      LoadStats,
    pub train_size:      usize,
    pub eval_size:       usize,
    pub vocabulary_size: usize,
    pub epochs:          usize,
    pub converged:       bool,
    pub objective:       Option<f64>,
    /// None when the evaluation stage failed
    pub evaluation:      Option<EvaluationReport>,
    pub samples:         Vec<SamplePrediction>,
}

// ─── Stage tracking ──────────────────────────────────────────────────────────
/// Walks the stages in order and tags failures with the stage
/// that was being attempted.
struct StageTracker {
    current: TrainingStage,
}

impl StageTracker {
    fn new() -> Self {
        Self { current: TrainingStage::Idle }
    }

    fn run<T>(&mut self, work: impl FnOnce() -> Result<T>) -> Result<T> {
        let target = self
            .current
            .next()
            .ok_or_else(|| ScorerError::Model("training run already finished".into()))?;

        let out = work().map_err(|e| e.at_stage(target))?;
        tracing::debug!("Training stage: {} → {}", self.current, target);
        self.current = target;
        Ok(out)
    }
}

/// What the report needs from the optimizer once the model is packed.
struct FitSummary {
    history:   Vec<EpochMetrics>,
    converged: bool,
    objective: Option<f64>,
}

/// Documents after normalization, raw text kept alongside.
struct NormalizedCorpus {
    documents:  Vec<Document>,
    normalized: Vec<String>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Execute the full training pipeline on the configured CSV files.
    pub fn execute(&self) -> Result<TrainReport> {
        let loader = CsvCorpusLoader::new(&self.config.real_csv, &self.config.fake_csv)
            .with_title(self.config.include_title);
        self.execute_with(&loader)
    }

    /// Execute the full training pipeline on documents from `source`.
    pub fn execute_with(&self, source: &dyn CorpusSource) -> Result<TrainReport> {
        let cfg        = &self.config;
        let store      = ModelStore::new(&cfg.model_dir);
        let normalizer = TextNormalizer::new();
        let mut stages = StageTracker::new();

        // ── Stage 1: Load the labelled corpus ────────────────────────────────
        let Corpus { documents, stats: load_stats } = stages.run(|| {
            let corpus = source.load_all()?;
            ensure_both_labels(&corpus.documents, "corpus")?;
            tracing::info!(
                "Corpus: {} documents ({} rows skipped)",
                corpus.documents.len(),
                corpus.stats.skipped()
            );
            Ok(corpus)
        })?;

        // ── Stage 2: Normalize every document ────────────────────────────────
        let corpus = stages.run(|| {
            let normalized = normalizer.normalize_all(
                &documents.iter().map(Document::text).collect::<Vec<_>>(),
            );
            Ok(NormalizedCorpus { documents, normalized })
        })?;

        // ── Stage 3: Split, then fit TF-IDF on the training split only ───────
        let (train_idx, eval_idx, extractor) = stages.run(|| {
            let indices: Vec<usize> = (0..corpus.documents.len()).collect();
            let (train_idx, eval_idx) = split_train_eval(indices, cfg.eval_fraction, cfg.seed);

            let train_docs: Vec<Document> =
                train_idx.iter().map(|&i| corpus.documents[i].clone()).collect();
            ensure_both_labels(&train_docs, "training split")?;

            let train_text: Vec<&str> =
                train_idx.iter().map(|&i| corpus.normalized[i].as_str()).collect();
            let extractor = cfg.features.fit(&train_text)?;
            tracing::info!(
                "Split {} train / {} eval; vocabulary of {} terms from {} documents",
                train_idx.len(),
                eval_idx.len(),
                extractor.vocabulary_size(),
                extractor.n_documents()
            );
            Ok((train_idx, eval_idx, extractor))
        })?;

        // ── Stage 4: Fit the classifier ──────────────────────────────────────
        let (artifact, fit) = stages.run(|| {
            let samples = train_idx
                .iter()
                .map(|&i| {
                    let label = corpus.documents[i].label().ok_or_else(|| {
                        ScorerError::TrainingData(format!(
                            "document '{}' has no label",
                            corpus.documents[i].source()
                        ))
                    })?;
                    Ok(ArticleSample::new(extractor.transform_one(&corpus.normalized[i]), label))
                })
                .collect::<Result<Vec<_>>>()?;
            let outcome = fit_classifier(
                &cfg.classifier,
                ArticleDataset::new(samples),
                extractor.vocabulary_size(),
            )?;

            let objective = outcome.best_objective();
            let FitOutcome { classifier, history, converged, .. } = outcome;
            let artifact = ModelArtifact::new(extractor, classifier)?;
            Ok((artifact, FitSummary { history, converged, objective }))
        })?;

        // ── Stage 5: Evaluate on the held-out split (non-fatal) ──────────────
        let (evaluation, samples) = stages.run(|| {
            Ok(match evaluate(&artifact, &corpus, &eval_idx) {
                Ok((report, samples)) => {
                    tracing::info!("Evaluation accuracy: {:.4}", report.accuracy);
                    (Some(report), samples)
                }
                Err(e) => {
                    tracing::warn!("Evaluation skipped: {}", e);
                    (None, Vec::new())
                }
            })
        })?;

        // ── Stage 6: Persist artifact, config, report, history ───────────────
        let run_dir = stages.run(|| {
            let pending = store.begin(&artifact)?;
            pending.write_json(CONFIG_FILE, cfg)?;
            if let Some(report) = &evaluation {
                pending.write_json(EVALUATION_FILE, report)?;
            }
            MetricsLogger::create(pending.dir())?.log_all(&fit.history)?;
            let run_dir = pending.dir().to_path_buf();
            pending.commit()?;
            Ok(run_dir)
        })?;

        Ok(TrainReport {
            run_id:          artifact.run_id().to_string(),
            model_dir:       store.dir().to_path_buf(),
            run_dir,
            load_stats,
            train_size:      train_idx.len(),
            eval_size:       eval_idx.len(),
            vocabulary_size: artifact.extractor().vocabulary_size(),
            epochs:          fit.history.len(),
            converged:       fit.converged,
            objective:       fit.objective,
            evaluation,
            samples,
        })
    }
}

/// Score the evaluation split and keep the first few predictions.
fn evaluate(
    artifact: &ModelArtifact,
    corpus:   &NormalizedCorpus,
    eval_idx: &[usize],
) -> Result<(EvaluationReport, Vec<SamplePrediction>)> {
    let texts: Vec<&str> = eval_idx.iter().map(|&i| corpus.normalized[i].as_str()).collect();
    let truth: Vec<Label> = eval_idx
        .iter()
        .map(|&i| {
            corpus.documents[i].label().ok_or_else(|| {
                ScorerError::Evaluation(format!(
                    "document '{}' has no label",
                    corpus.documents[i].source()
                ))
            })
        })
        .collect::<Result<_>>()?;

    let fake_proba = artifact.predict_fake_proba(&texts)?;
    let report     = EvaluationReport::compute(&truth, &fake_proba)?;

    let samples = eval_idx
        .iter()
        .zip(&truth)
        .zip(&fake_proba)
        .take(SAMPLE_PREDICTIONS)
        .map(|((&i, &label), &p)| SamplePrediction {
            source:        corpus.documents[i].source().to_string(),
            label,
            probabilities: [1.0 - p, p],
        })
        .collect();

    Ok((report, samples))
}
