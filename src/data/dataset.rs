use std::sync::Arc;

use burn::data::dataset::Dataset;

use crate::data::tfidf::SparseVector;
use crate::domain::document::Label;

/// One vectorized, labelled training or evaluation sample.
#[derive(Debug, Clone)]
pub struct ArticleSample {
    pub features: SparseVector,
    pub label:    Label,
}

impl ArticleSample {
    pub fn new(features: SparseVector, label: Label) -> Self {
        Self { features, label }
    }
}

/// Shared, read-only sample list. Cloning only bumps a refcount, so the
/// trainer can hand the same data to several data loaders.
#[derive(Clone)]
pub struct ArticleDataset {
    samples: Arc<Vec<ArticleSample>>,
}

impl ArticleDataset {
    pub fn new(samples: Vec<ArticleSample>) -> Self { Self { samples: Arc::new(samples) } }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    /// Count of samples per class, indexed by `Label::index`.
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for s in self.samples.iter() {
            counts[s.label.index()] += 1;
        }
        counts
    }

    pub fn samples(&self) -> &[ArticleSample] {
        &self.samples
    }
}

impl Dataset<ArticleSample> for ArticleDataset {
    fn get(&self, index: usize) -> Option<ArticleSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_counts_and_get() {
        let ds = ArticleDataset::new(vec![
            ArticleSample::new(SparseVector::zeros(2), Label::Fake),
            ArticleSample::new(SparseVector::zeros(2), Label::Real),
            ArticleSample::new(SparseVector::zeros(2), Label::Fake),
        ]);
        assert_eq!(ds.class_counts(), [1, 2]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.get(1).map(|s| s.label), Some(Label::Real));
        assert!(ds.get(3).is_none());
    }
}
