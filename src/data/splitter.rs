// ============================================================
// Layer 4 — Train/Evaluation Splitter
// ============================================================
// Shuffles samples with a SEEDED generator and splits them
// into a training set and a held-out evaluation set.
//
// Why seeded?
//   Two training runs on the same corpus must see the same
//   split, otherwise their evaluation accuracies can't be
//   compared. StdRng::seed_from_u64 gives the same shuffle
//   for the same seed every time.
//
// Sizes:
//   n_eval  = ceil(n × eval_fraction)
//   n_train = n − n_eval
// The two sets are disjoint and together hold every sample.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Seed used when the caller does not pick one.
pub const DEFAULT_SEED: u64 = 42;

/// Shuffle `samples` with `seed` and split into (train, eval).
pub fn split_train_eval<T>(mut samples: Vec<T>, eval_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total  = samples.len();
    // the small epsilon keeps 100 × 0.2 from rounding up to 21
    let n_eval = ((total as f64) * eval_fraction.clamp(0.0, 1.0) - 1e-9).ceil().max(0.0) as usize;
    let n_eval = n_eval.min(total);

    // split_off(k) leaves [0..k) in `samples` and returns [k..total)
    let eval = samples.split_off(total - n_eval);

    tracing::debug!(
        "Dataset split (seed {}): {} training, {} evaluation",
        seed,
        samples.len(),
        eval.len(),
    );

    (samples, eval)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, eval)     = split_train_eval(items, 0.2, DEFAULT_SEED);
        assert_eq!(train.len(), 80);
        assert_eq!(eval.len(),  20);
    }

    #[test]
    fn test_eval_size_rounds_up() {
        let items: Vec<usize> = (0..11).collect();
        let (train, eval)     = split_train_eval(items, 0.2, DEFAULT_SEED);
        assert_eq!(eval.len(),  3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_disjoint_and_complete() {
        let items: Vec<usize> = (0..57).collect();
        let (train, eval)     = split_train_eval(items, 0.2, 7);
        let a: HashSet<_> = train.iter().copied().collect();
        let b: HashSet<_> = eval.iter().copied().collect();
        assert!(a.is_disjoint(&b));
        assert_eq!(a.len() + b.len(), 57);
    }

    #[test]
    fn test_same_seed_same_split() {
        let (t1, e1) = split_train_eval((0..40).collect::<Vec<_>>(), 0.2, 42);
        let (t2, e2) = split_train_eval((0..40).collect::<Vec<_>>(), 0.2, 42);
        assert_eq!(t1, t2);
        assert_eq!(e1, e2);
    }

    #[test]
    fn test_empty_dataset() {
        let (train, eval) = split_train_eval(Vec::<usize>::new(), 0.2, DEFAULT_SEED);
        assert!(train.is_empty());
        assert!(eval.is_empty());
    }

    #[test]
    fn test_zero_fraction_keeps_everything_for_training() {
        let (train, eval) = split_train_eval((0..10).collect::<Vec<_>>(), 0.0, DEFAULT_SEED);
        assert_eq!(train.len(), 10);
        assert!(eval.is_empty());
    }
}
