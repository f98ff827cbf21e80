// ============================================================
// Layer 5 — Fitted Classifier
// ============================================================
// A trained logistic model on the CPU (NdArray) backend,
// frozen for inference.
//
//   predict_fake_proba  → P(FAKE) per input vector
//   predict_proba       → [P(REAL), P(FAKE)] per input vector
//   weights/from_weights → exact f32 round-trip of w and b
//
// Persistence goes through plain ClassifierWeights rather than
// a burn record: records carry random parameter ids, and a
// truncated record blob aborts the process inside the recorder.

use burn::{
    backend::{ndarray::NdArrayDevice, NdArray},
    module::Param,
    prelude::*,
    tensor::TensorData,
};
use serde::{Deserialize, Serialize};

use crate::data::batcher::dense_features;
use crate::data::tfidf::SparseVector;
use crate::error::{Result, ScorerError};
use crate::ml::model::{LogisticRegression, LogisticRegressionConfig};

pub type InferBackend = NdArray;

/// Learned parameters of P(FAKE | x) = sigmoid(x·w + b).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierWeights {
    /// One weight per TF-IDF feature
    pub weights: Vec<f32>,
    pub bias:    f32,
}

impl ClassifierWeights {
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }
}

#[derive(Debug)]
pub struct FittedClassifier {
    model:  LogisticRegression<InferBackend>,
    device: NdArrayDevice,
}

impl FittedClassifier {
    pub fn new(model: LogisticRegression<InferBackend>) -> Self {
        Self { model, device: NdArrayDevice::default() }
    }

    /// Input width the model expects.
    pub fn n_features(&self) -> usize {
        self.model.n_features
    }

    /// P(FAKE) for each vector, in input order.
    pub fn predict_fake_proba(&self, features: &[SparseVector]) -> Result<Vec<f64>> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(bad) = features.iter().find(|v| v.dim() != self.n_features()) {
            return Err(ScorerError::Model(format!(
                "feature vector has dimension {} but the classifier expects {}",
                bad.dim(),
                self.n_features()
            )));
        }

        let rows: Vec<&SparseVector> = features.iter().collect();
        let x     = dense_features::<InferBackend>(&rows, self.n_features(), &self.device);
        let probs = self
            .model
            .predict_proba(x)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| ScorerError::Model(format!("cannot read probabilities: {e:?}")))?;

        Ok(probs.into_iter().map(f64::from).collect())
    }

    /// Two-class distribution [P(REAL), P(FAKE)] per vector.
    pub fn predict_proba(&self, features: &[SparseVector]) -> Result<Vec<[f64; 2]>> {
        Ok(self
            .predict_fake_proba(features)?
            .into_iter()
            .map(|p| [1.0 - p, p])
            .collect())
    }

    /// Copy the learned weights and bias out of the model.
    pub fn weights(&self) -> Result<ClassifierWeights> {
        let weights = read_f32(self.model.linear.weight.val().into_data())?;
        let bias = match &self.model.linear.bias {
            Some(b) => read_f32(b.val().into_data())?.first().copied().unwrap_or(0.0),
            None    => 0.0,
        };
        Ok(ClassifierWeights { weights, bias })
    }

    /// Rebuild a classifier from stored weights.
    pub fn from_weights(stored: ClassifierWeights) -> Result<Self> {
        let n = stored.n_features();
        if n == 0 {
            return Err(ScorerError::Model("stored classifier has no weights".into()));
        }
        if !stored.bias.is_finite() || stored.weights.iter().any(|w| !w.is_finite()) {
            return Err(ScorerError::Model("stored classifier has non-finite weights".into()));
        }

        let device    = NdArrayDevice::default();
        let mut model = LogisticRegressionConfig::new(n).init::<InferBackend>(&device);
        model.linear.weight = Param::from_tensor(Tensor::from_data(
            TensorData::new(stored.weights, [n, 1]),
            &device,
        ));
        model.linear.bias = Some(Param::from_tensor(Tensor::from_data(
            TensorData::new(vec![stored.bias], [1]),
            &device,
        )));
        Ok(Self { model, device })
    }
}

fn read_f32(data: TensorData) -> Result<Vec<f32>> {
    data.to_vec::<f32>()
        .map_err(|e| ScorerError::Model(format!("cannot read classifier weights: {e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_classifier(n: usize) -> FittedClassifier {
        FittedClassifier::new(LogisticRegressionConfig::new(n).init(&NdArrayDevice::default()))
    }

    #[test]
    fn test_untrained_model_is_undecided() {
        let clf   = zero_classifier(4);
        let probs = clf.predict_proba(&[SparseVector::zeros(4)]).unwrap();
        assert_eq!(probs, vec![[0.5, 0.5]]);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let clf = zero_classifier(4);
        assert!(matches!(
            clf.predict_fake_proba(&[SparseVector::zeros(3)]),
            Err(ScorerError::Model(_))
        ));
    }

    #[test]
    fn test_weights_round_trip() {
        let stored = ClassifierWeights { weights: vec![0.25, -1.5, 3.0], bias: -0.125 };
        let clf    = FittedClassifier::from_weights(stored.clone()).unwrap();
        assert_eq!(clf.n_features(), 3);
        assert_eq!(clf.weights().unwrap(), stored);

        let x = SparseVector::from_pairs(3, vec![(2, 1.0)]);
        let p = clf.predict_fake_proba(&[x]).unwrap()[0];
        let expected = 1.0 / (1.0 + (-(3.0f64 - 0.125)).exp());
        assert!((p - expected).abs() < 1e-6, "{p} vs {expected}");
    }

    #[test]
    fn test_unusable_weights_rejected() {
        let empty = ClassifierWeights { weights: Vec::new(), bias: 0.0 };
        assert!(matches!(FittedClassifier::from_weights(empty), Err(ScorerError::Model(_))));

        let nan = ClassifierWeights { weights: vec![1.0, f32::NAN], bias: 0.0 };
        assert!(matches!(FittedClassifier::from_weights(nan), Err(ScorerError::Model(_))));
    }
}
