// ============================================================
// Layer 4 — Article Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<ArticleSample>
// into dense tensors for the logistic model.
//
// The TF-IDF vectors are sparse (a short article touches a few
// dozen of 5000 terms), so the full training matrix is never
// materialised. Each mini-batch is densified on its own:
//
//   Input:  N samples, each a SparseVector of dimension V
//   Output: features [N, V] (f32), targets [N] (0.0 = REAL, 1.0 = FAKE)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::ArticleSample;
use crate::data::tfidf::SparseVector;

// ─── ArticleBatch ─────────────────────────────────────────────────────────────
/// A batch of vectorized articles. First dimension is the batch size.
#[derive(Debug, Clone)]
pub struct ArticleBatch<B: Backend> {
    /// Dense TF-IDF rows — shape: [batch_size, n_features]
    pub features: Tensor<B, 2>,

    /// Class targets — shape: [batch_size]
    pub targets: Tensor<B, 1>,
}

// ─── ArticleBatcher ───────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ArticleBatcher<B: Backend> {
    /// The device to create tensors on
    pub device: B::Device,

    /// Width of every row (the extractor's vocabulary size)
    pub n_features: usize,
}

impl<B: Backend> ArticleBatcher<B> {
    pub fn new(device: B::Device, n_features: usize) -> Self {
        Self { device, n_features }
    }
}

/// Stack sparse rows into one dense [rows, n_features] tensor.
pub fn dense_features<B: Backend>(
    rows:       &[&SparseVector],
    n_features: usize,
    device:     &B::Device,
) -> Tensor<B, 2> {
    let mut flat = vec![0.0f32; rows.len() * n_features];
    for (row, vector) in flat.chunks_mut(n_features.max(1)).zip(rows) {
        vector.scatter_into(row);
    }
    Tensor::from_data(TensorData::new(flat, [rows.len(), n_features]), device)
}

impl<B: Backend> Batcher<ArticleSample, ArticleBatch<B>> for ArticleBatcher<B> {
    fn batch(&self, items: Vec<ArticleSample>) -> ArticleBatch<B> {
        let rows: Vec<&SparseVector> = items.iter().map(|s| &s.features).collect();
        let features = dense_features::<B>(&rows, self.n_features, &self.device);

        let targets: Vec<f32> = items.iter().map(|s| s.label.target()).collect();
        let targets = Tensor::from_data(TensorData::new(targets, [items.len()]), &self.device);

        ArticleBatch { features, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::Label;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn test_batch_shapes_and_targets() {
        let batcher = ArticleBatcher::<B>::new(Default::default(), 4);
        let batch   = batcher.batch(vec![
            ArticleSample::new(SparseVector::from_pairs(4, vec![(1, 0.6), (3, 0.8)]), Label::Real),
            ArticleSample::new(SparseVector::zeros(4), Label::Fake),
        ]);
        assert_eq!(batch.features.dims(), [2, 4]);

        let targets: Vec<f32> = batch.targets.into_data().to_vec().unwrap();
        assert_eq!(targets, vec![0.0, 1.0]);
    }

    #[test]
    fn test_sparse_rows_scattered_in_place() {
        let a = SparseVector::from_pairs(3, vec![(2, 0.5)]);
        let b = SparseVector::from_pairs(3, vec![(0, 1.0)]);
        let x = dense_features::<B>(&[&a, &b], 3, &Default::default());
        let flat: Vec<f32> = x.into_data().to_vec().unwrap();
        assert_eq!(flat, vec![0.0, 0.0, 0.5, 1.0, 0.0, 0.0]);
    }
}
