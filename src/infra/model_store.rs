// ============================================================
// Layer 6 — Model Store
// ============================================================
// Saves and restores the fitted extractor + classifier pair.
//
// What gets saved per training run:
//   1. model.extractor.bin  — TF-IDF vocabulary and IDF weights
//   2. model.classifier.bin — logistic weights and bias
//   3. train_config.json    — the configuration that produced them
//   4. evaluation.json      — held-out metrics, only when available
//   5. training_history.csv — written by MetricsLogger
//
// Both .bin files are bincode envelopes stamped with the run id
// and vocabulary size. A pair written by two different runs is
// rejected on load instead of silently mixing vocabularies.
//
// Write protocol:
//   - store.lock is created exclusively for the duration of a
//     save; a second writer gets ArtifactLocked
//   - every file of a run goes into a fresh runs/<run id>/
//     directory that no reader looks at yet
//   - CURRENT is then replaced by one atomic rename; that single
//     switch is the moment the new model goes live
//   - a run dropped before the switch deletes its directory
//
// Readers follow CURRENT, so they see the old run or the new
// one and never a mix. The run CURRENT pointed at before the
// switch is kept for readers still holding it; older runs are
// pruned.
//
// File layout:
//   models/
//     CURRENT                ← id of the live run
//     runs/
//       <run id>/
//         model.extractor.bin
//         model.classifier.bin
//         train_config.json
//         evaluation.json
//         training_history.csv

use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::data::normalizer::STOPWORDS_VERSION;
use crate::data::tfidf::TfidfVectorizer;
use crate::error::{Result, ScorerError};
use crate::ml::classifier::{ClassifierWeights, FittedClassifier};

/// Bumped whenever the envelope layout changes.
const FORMAT_VERSION: u32 = 2;

pub const EXTRACTOR_FILE: &str = "model.extractor.bin";
pub const CLASSIFIER_FILE: &str = "model.classifier.bin";
pub const CONFIG_FILE: &str = "train_config.json";
pub const EVALUATION_FILE: &str = "evaluation.json";

const CURRENT_FILE: &str = "CURRENT";
const LOCK_FILE: &str = "store.lock";
const RUNS_DIR: &str = "runs";

// ─── ModelArtifact ────────────────────────────────────────────────────────────
/// A fitted extractor and the classifier trained on its output.
#[derive(Debug)]
pub struct ModelArtifact {
    run_id:     String,
    extractor:  TfidfVectorizer,
    classifier: FittedClassifier,
}

impl ModelArtifact {
    /// Pair a fresh extractor and classifier under a new run id.
    pub fn new(extractor: TfidfVectorizer, classifier: FittedClassifier) -> Result<Self> {
        Self::with_run_id(Uuid::new_v4().to_string(), extractor, classifier)
    }

    fn with_run_id(
        run_id:     String,
        extractor:  TfidfVectorizer,
        classifier: FittedClassifier,
    ) -> Result<Self> {
        if classifier.n_features() != extractor.vocabulary_size() {
            return Err(ScorerError::Model(format!(
                "classifier expects {} features but the extractor produces {}",
                classifier.n_features(),
                extractor.vocabulary_size()
            )));
        }
        Ok(Self { run_id, extractor, classifier })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn extractor(&self) -> &TfidfVectorizer {
        &self.extractor
    }

    pub fn classifier(&self) -> &FittedClassifier {
        &self.classifier
    }

    /// P(FAKE) for already-normalized texts.
    pub fn predict_fake_proba<S: AsRef<str>>(&self, normalized: &[S]) -> Result<Vec<f64>> {
        let features = self.extractor.transform(normalized);
        self.classifier.predict_fake_proba(&features)
    }
}

// ─── On-disk envelopes ────────────────────────────────────────────────────────
#[derive(Serialize, Deserialize)]
struct ExtractorEnvelope {
    format:            u32,
    run_id:            String,
    vocabulary_size:   usize,
    stopwords_version: u32,
    extractor:         TfidfVectorizer,
}

#[derive(Serialize, Deserialize)]
struct ClassifierEnvelope {
    format:     u32,
    run_id:     String,
    n_features: usize,
    classifier: ClassifierWeights,
}

// ─── Write lock ───────────────────────────────────────────────────────────────
/// Exclusive lock file, removed when dropped.
struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    fn acquire(path: PathBuf) -> Result<Self> {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut f) => {
                writeln!(f, "{}", std::process::id())?;
                Ok(Self { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(ScorerError::ArtifactLocked { path })
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Could not remove lock file '{}': {}", self.path.display(), e);
        }
    }
}

// ─── PendingRun ───────────────────────────────────────────────────────────────
/// A run whose files are being written but which is not live yet.
///
/// Holds the store lock until it is committed or dropped.
/// Dropping it without `commit` deletes everything it wrote.
pub struct PendingRun {
    store:     ModelStore,
    run_id:    String,
    dir:       PathBuf,
    committed: bool,
    _lock:     StoreLock,
}

impl PendingRun {
    /// Directory that receives this run's files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Write a pretty-printed JSON file into the run directory.
    pub fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        let path = self.dir.join(file);
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    /// Make this run the live model with one atomic rename of CURRENT.
    pub fn commit(mut self) -> Result<()> {
        let previous = self.store.current_run_id().ok();

        write_atomic(&self.store.current_path(), format!("{}\n", self.run_id).as_bytes())?;
        self.committed = true;
        tracing::info!(
            "Saved model artifact (run {}) to '{}'",
            self.run_id,
            self.store.dir.display()
        );

        self.store.prune(&self.run_id, previous.as_deref());
        Ok(())
    }
}

impl Drop for PendingRun {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        tracing::warn!("Discarding unfinished run {}", self.run_id);
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            tracing::warn!("Could not remove '{}': {}", self.dir.display(), e);
        }
    }
}

// ─── ModelStore ───────────────────────────────────────────────────────────────
/// Reads and writes model artifacts in one directory.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory holding the files of one run.
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.dir.join(RUNS_DIR).join(run_id)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    fn current_path(&self) -> PathBuf {
        self.dir.join(CURRENT_FILE)
    }

    /// Id of the live run, as recorded in CURRENT.
    pub fn current_run_id(&self) -> Result<String> {
        let path = self.current_path();
        let raw  = read_artifact(&path)?;
        let id   = String::from_utf8_lossy(&raw).trim().to_string();
        Uuid::parse_str(&id).map_err(|e| ScorerError::corrupt(&path, e))?;
        Ok(id)
    }

    /// Directory of the live run.
    pub fn current_run_dir(&self) -> Result<PathBuf> {
        Ok(self.run_dir(&self.current_run_id()?))
    }

    /// True when a live run with both artifact files exists (they may still be corrupt).
    pub fn exists(&self) -> bool {
        self.current_run_dir()
            .map(|dir| dir.join(EXTRACTOR_FILE).is_file() && dir.join(CLASSIFIER_FILE).is_file())
            .unwrap_or(false)
    }

    /// Lock the store and write both halves of the artifact into a
    /// fresh run directory. Nothing is live until `commit`.
    pub fn begin(&self, artifact: &ModelArtifact) -> Result<PendingRun> {
        fs::create_dir_all(&self.dir)?;
        let lock = StoreLock::acquire(self.lock_path())?;

        let config = bincode::config::standard();

        let extractor = ExtractorEnvelope {
            format:            FORMAT_VERSION,
            run_id:            artifact.run_id.clone(),
            vocabulary_size:   artifact.extractor.vocabulary_size(),
            stopwords_version: STOPWORDS_VERSION,
            extractor:         artifact.extractor.clone(),
        };
        let extractor_bytes = bincode::serde::encode_to_vec(&extractor, config)
            .map_err(|e| ScorerError::Model(format!("cannot encode extractor: {e}")))?;

        let classifier = ClassifierEnvelope {
            format:     FORMAT_VERSION,
            run_id:     artifact.run_id.clone(),
            n_features: artifact.classifier.n_features(),
            classifier: artifact.classifier.weights()?,
        };
        let classifier_bytes = bincode::serde::encode_to_vec(&classifier, config)
            .map_err(|e| ScorerError::Model(format!("cannot encode classifier: {e}")))?;

        let dir = self.run_dir(&artifact.run_id);
        fs::create_dir_all(&dir)?;
        let pending = PendingRun {
            store:     self.clone(),
            run_id:    artifact.run_id.clone(),
            dir,
            committed: false,
            _lock:     lock,
        };

        write_atomic(&pending.dir.join(EXTRACTOR_FILE), &extractor_bytes)?;
        write_atomic(&pending.dir.join(CLASSIFIER_FILE), &classifier_bytes)?;
        Ok(pending)
    }

    /// Persist the artifact alone and make it live.
    pub fn save(&self, artifact: &ModelArtifact) -> Result<()> {
        self.begin(artifact)?.commit()
    }

    /// Load and cross-check both halves of the live artifact.
    pub fn load(&self) -> Result<ModelArtifact> {
        let run_id          = self.current_run_id()?;
        let run_dir         = self.run_dir(&run_id);
        let extractor_path  = run_dir.join(EXTRACTOR_FILE);
        let classifier_path = run_dir.join(CLASSIFIER_FILE);

        let extractor_bytes  = read_artifact(&extractor_path)?;
        let classifier_bytes = read_artifact(&classifier_path)?;

        let config = bincode::config::standard();

        let (extractor, _): (ExtractorEnvelope, usize) =
            bincode::serde::decode_from_slice(&extractor_bytes, config)
                .map_err(|e| ScorerError::corrupt(&extractor_path, e))?;
        let (classifier, _): (ClassifierEnvelope, usize) =
            bincode::serde::decode_from_slice(&classifier_bytes, config)
                .map_err(|e| ScorerError::corrupt(&classifier_path, e))?;

        if extractor.format != FORMAT_VERSION {
            return Err(ScorerError::corrupt(
                &extractor_path,
                format!("unsupported format version {}", extractor.format),
            ));
        }
        if classifier.format != FORMAT_VERSION {
            return Err(ScorerError::corrupt(
                &classifier_path,
                format!("unsupported format version {}", classifier.format),
            ));
        }
        if extractor.stopwords_version != STOPWORDS_VERSION {
            return Err(ScorerError::corrupt(
                &extractor_path,
                format!(
                    "trained with stopword list v{}, this build has v{}",
                    extractor.stopwords_version, STOPWORDS_VERSION
                ),
            ));
        }
        if extractor.run_id != run_id {
            return Err(ScorerError::corrupt(
                &extractor_path,
                format!("extractor belongs to run {} but sits in run {run_id}", extractor.run_id),
            ));
        }
        if classifier.run_id != extractor.run_id {
            return Err(ScorerError::corrupt(
                &classifier_path,
                format!(
                    "classifier belongs to run {} but extractor to run {}",
                    classifier.run_id, extractor.run_id
                ),
            ));
        }
        if extractor.vocabulary_size != extractor.extractor.vocabulary_size()
            || classifier.n_features != extractor.vocabulary_size
            || classifier.classifier.n_features() != classifier.n_features
        {
            return Err(ScorerError::corrupt(
                &classifier_path,
                format!(
                    "classifier has {} inputs ({} weights stored), extractor vocabulary has {} terms",
                    classifier.n_features,
                    classifier.classifier.n_features(),
                    extractor.vocabulary_size
                ),
            ));
        }

        let fitted = FittedClassifier::from_weights(classifier.classifier)
            .map_err(|e| ScorerError::corrupt(&classifier_path, e))?;

        tracing::debug!("Loaded model artifact (run {})", extractor.run_id);
        ModelArtifact::with_run_id(extractor.run_id, extractor.extractor, fitted)
            .map_err(|e| ScorerError::corrupt(&classifier_path, e))
    }

    /// Read a JSON file written alongside the live run.
    pub fn load_json<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        let path = self.current_run_dir()?.join(file);
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Remove every run except the new one and the one it replaced.
    fn prune(&self, keep: &str, previous: Option<&str>) {
        let entries = match fs::read_dir(self.dir.join(RUNS_DIR)) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Could not list old runs: {}", e);
                return;
            }
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == keep || Some(name.as_ref()) == previous {
                continue;
            }
            match fs::remove_dir_all(entry.path()) {
                Ok(())  => tracing::debug!("Pruned old run {}", name),
                Err(e) => tracing::warn!("Could not prune run {}: {}", name, e),
            }
        }
    }
}

/// Write to a temp file next to `path`, then rename it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent  = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ScorerError::ArtifactMissing { path: path.to_path_buf() },
        _ => ScorerError::Io(e),
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tfidf::TfidfConfig;
    use crate::ml::model::LogisticRegressionConfig;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::prelude::*;

    fn artifact() -> ModelArtifact {
        let extractor = TfidfConfig::default()
            .fit(&["official report budget", "shocking secret aliens"])
            .unwrap();
        let n     = extractor.vocabulary_size();
        let model = LogisticRegressionConfig::new(n).init::<burn::backend::NdArray>(&NdArrayDevice::default());

        // Non-zero weights so the round-trip check means something.
        let weights: Vec<f32> = (0..n).map(|i| i as f32 * 0.37 - 0.5).collect();
        let mut model = model;
        model.linear.weight = burn::module::Param::from_tensor(Tensor::from_data(
            burn::tensor::TensorData::new(weights, [n, 1]),
            &NdArrayDevice::default(),
        ));
        ModelArtifact::new(extractor, FittedClassifier::new(model)).unwrap()
    }

    fn classifier_path(store: &ModelStore) -> PathBuf {
        store.current_run_dir().unwrap().join(CLASSIFIER_FILE)
    }

    #[test]
    fn test_round_trip_predictions_identical() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let a     = artifact();
        store.save(&a).unwrap();

        let b     = store.load().unwrap();
        let texts = ["official secret", "budget report", ""];
        assert_eq!(b.run_id(), a.run_id());
        assert_eq!(a.predict_fake_proba(&texts).unwrap(), b.predict_fake_proba(&texts).unwrap());
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ScorerError::ArtifactMissing { .. }));
        assert!(err.is_model_unavailable());
    }

    #[test]
    fn test_one_half_missing() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        store.save(&artifact()).unwrap();
        fs::remove_file(classifier_path(&store)).unwrap();
        assert!(!store.exists());
        assert!(matches!(store.load(), Err(ScorerError::ArtifactMissing { .. })));
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        store.save(&artifact()).unwrap();
        fs::write(store.current_run_dir().unwrap().join(EXTRACTOR_FILE), b"not bincode").unwrap();
        assert!(matches!(store.load(), Err(ScorerError::ArtifactCorrupt { .. })));
    }

    #[test]
    fn test_truncated_weights_are_corrupt_not_fatal() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        store.save(&artifact()).unwrap();
        let path   = classifier_path(&store);
        let config = bincode::config::standard();

        // Well-formed envelope whose weight vector lost most of its entries.
        let (mut envelope, _): (ClassifierEnvelope, usize) =
            bincode::serde::decode_from_slice(&fs::read(&path).unwrap(), config).unwrap();
        envelope.classifier.weights.truncate(1);
        fs::write(&path, bincode::serde::encode_to_vec(&envelope, config).unwrap()).unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, ScorerError::ArtifactCorrupt { .. }), "{err}");

        // Raw bytes cut off halfway through.
        store.save(&artifact()).unwrap();
        let path  = classifier_path(&store);
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, ScorerError::ArtifactCorrupt { .. }), "{err}");
    }

    #[test]
    fn test_mismatched_pair_rejected() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = ModelStore::new(dir.path());
        let first  = artifact();
        let second = artifact();
        store.save(&first).unwrap();
        store.save(&second).unwrap();

        // Same vocabulary, different runs.
        fs::copy(
            store.run_dir(first.run_id()).join(CLASSIFIER_FILE),
            store.run_dir(second.run_id()).join(CLASSIFIER_FILE),
        )
        .unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, ScorerError::ArtifactCorrupt { .. }), "{err}");
    }

    #[test]
    fn test_failed_second_write_keeps_previous_model() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let old   = artifact();
        store.save(&old).unwrap();

        // A directory squatting on the classifier path makes that rename fail
        // after the extractor of the new run has already been written.
        let new = artifact();
        fs::create_dir_all(store.run_dir(new.run_id()).join(CLASSIFIER_FILE)).unwrap();
        assert!(store.save(&new).is_err());

        assert_eq!(store.current_run_id().unwrap(), old.run_id());
        assert_eq!(store.load().unwrap().run_id(), old.run_id());
        assert!(!store.run_dir(new.run_id()).exists());
        assert!(!store.lock_path().exists());
    }

    #[test]
    fn test_uncommitted_run_is_invisible_and_discarded() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let old   = artifact();
        store.save(&old).unwrap();

        let new     = artifact();
        let pending = store.begin(&new).unwrap();
        pending.write_json(CONFIG_FILE, &TfidfConfig::new(7)).unwrap();
        assert_eq!(store.load().unwrap().run_id(), old.run_id());
        drop(pending);

        assert!(!store.run_dir(new.run_id()).exists());
        assert_eq!(store.load().unwrap().run_id(), old.run_id());
    }

    #[test]
    fn test_old_runs_pruned_previous_kept() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let runs: Vec<ModelArtifact> = (0..3).map(|_| artifact()).collect();
        for a in &runs {
            store.save(a).unwrap();
        }

        assert!(!store.run_dir(runs[0].run_id()).exists());
        assert!(store.run_dir(runs[1].run_id()).exists());
        assert_eq!(store.load().unwrap().run_id(), runs[2].run_id());
    }

    #[test]
    fn test_lock_blocks_second_writer() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let held  = StoreLock::acquire(store.lock_path()).unwrap();
        assert!(matches!(store.save(&artifact()), Err(ScorerError::ArtifactLocked { .. })));

        drop(held);
        store.save(&artifact()).unwrap();
        assert!(!store.lock_path().exists());
    }

    #[test]
    fn test_garbled_pointer_is_corrupt() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        fs::write(dir.path().join(CURRENT_FILE), "../../etc\n").unwrap();
        assert!(matches!(store.load(), Err(ScorerError::ArtifactCorrupt { .. })));
    }

    #[test]
    fn test_config_json_round_trip() {
        let dir     = tempfile::tempdir().unwrap();
        let store   = ModelStore::new(dir.path());
        let pending = store.begin(&artifact()).unwrap();
        pending.write_json(CONFIG_FILE, &TfidfConfig::new(42)).unwrap();
        pending.commit().unwrap();

        let back: TfidfConfig = store.load_json(CONFIG_FILE).unwrap();
        assert_eq!(back.max_features, 42);
    }
}
