use burn::{
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct LogisticRegressionConfig {
    /// Input width — must equal the TF-IDF vocabulary size
    pub n_features: usize,
}

impl LogisticRegressionConfig {
    /// Weights and bias start at zero so every fit is reproducible.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LogisticRegression<B> {
        let linear = LinearConfig::new(self.n_features, 1)
            .with_bias(true)
            .with_initializer(Initializer::Zeros)
            .init(device);
        LogisticRegression { linear, n_features: self.n_features }
    }
}

/// Binary logistic regression: P(FAKE | x) = sigmoid(x·w + b).
#[derive(Module, Debug)]
pub struct LogisticRegression<B: Backend> {
    pub linear:     Linear<B>,
    pub n_features: usize,
}

impl<B: Backend> LogisticRegression<B> {
    /// Raw logits, shape [batch].
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 1> {
        self.linear.forward(features).flatten::<1>(0, 1)
    }

    /// P(FAKE) per row, shape [batch].
    pub fn predict_proba(&self, features: Tensor<B, 2>) -> Tensor<B, 1> {
        activation::sigmoid(self.forward(features))
    }

    /// Mean binary cross-entropy on logits.
    ///
    /// Written as softplus(z) − y·z with softplus(z) = max(z, 0) + ln(1 + e^−|z|),
    /// which never overflows for large |z|.
    pub fn data_loss(&self, logits: Tensor<B, 1>, targets: Tensor<B, 1>) -> Tensor<B, 1> {
        let softplus = logits.clone().clamp_min(0.0)
            + logits.clone().abs().neg().exp().add_scalar(1.0).log();
        (softplus - targets * logits).mean()
    }

    /// ‖w‖², bias excluded.
    pub fn squared_weight_norm(&self) -> Tensor<B, 1> {
        let w = self.linear.weight.val();
        (w.clone() * w).sum()
    }

    /// Regularized objective: data_loss + (l2 / 2)·‖w‖².
    pub fn objective(
        &self,
        features: Tensor<B, 2>,
        targets:  Tensor<B, 1>,
        l2:       f64,
    ) -> Tensor<B, 1> {
        let logits = self.forward(features);
        self.data_loss(logits, targets) + self.squared_weight_norm().mul_scalar(l2 / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{ElementConversion, TensorData};

    type B = NdArray;

    #[test]
    fn test_zero_model_predicts_one_half() {
        let device = Default::default();
        let model  = LogisticRegressionConfig::new(3).init::<B>(&device);
        let x      = Tensor::<B, 2>::from_data(TensorData::new(vec![1.0f32, 0.0, 2.0, 0.0, 0.0, 0.0], [2, 3]), &device);
        let p: Vec<f32> = model.predict_proba(x).into_data().to_vec().unwrap();
        assert_eq!(p, vec![0.5, 0.5]);
    }

    #[test]
    fn test_loss_at_zero_is_ln2() {
        let device  = Default::default();
        let model   = LogisticRegressionConfig::new(2).init::<B>(&device);
        let logits  = Tensor::<B, 1>::from_data(TensorData::new(vec![0.0f32, 0.0], [2]), &device);
        let targets = Tensor::<B, 1>::from_data(TensorData::new(vec![0.0f32, 1.0], [2]), &device);
        let loss: f64 = model.data_loss(logits, targets).into_scalar().elem();
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-6);
    }

    #[test]
    fn test_loss_is_finite_for_extreme_logits() {
        let device  = Default::default();
        let model   = LogisticRegressionConfig::new(1).init::<B>(&device);
        let logits  = Tensor::<B, 1>::from_data(TensorData::new(vec![500.0f32, -500.0], [2]), &device);
        let targets = Tensor::<B, 1>::from_data(TensorData::new(vec![0.0f32, 1.0], [2]), &device);
        let loss: f64 = model.data_loss(logits, targets).into_scalar().elem();
        assert!(loss.is_finite());
        assert!((loss - 500.0).abs() < 1e-3);
    }
}
