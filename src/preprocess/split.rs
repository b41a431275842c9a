use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified shuffle split over binary `labels`.
///
/// Each class contributes `round(class_size * test_ratio)` rows to the test
/// partition, so both partitions keep the overall class balance. The result
/// depends only on `labels`, `test_ratio` and the state of `rng`.
pub fn train_test_split<R: Rng + ?Sized>(
    labels: &[f64],
    test_ratio: f64,
    rng: &mut R,
) -> Result<Split> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(Error::Training(format!("test ratio must be in (0, 1), got {}", test_ratio)));
    }

    let mut negatives: Vec<usize> = Vec::new();
    let mut positives: Vec<usize> = Vec::new();
    for (i, &y) in labels.iter().enumerate() {
        if y == 1.0 { positives.push(i) } else { negatives.push(i) }
    }

    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();
    for class in [&mut negatives, &mut positives] {
        class.shuffle(rng);
        let n_test = (class.len() as f64 * test_ratio).round() as usize;
        test.extend_from_slice(&class[..n_test]);
        train.extend_from_slice(&class[n_test..]);
    }

    if train.is_empty() || test.is_empty() {
        return Err(Error::Training(format!(
            "{} rows cannot be split into non-empty train and test partitions at ratio {}",
            labels.len(),
            test_ratio
        )));
    }

    train.shuffle(rng);
    test.shuffle(rng);
    Ok(Split { train, test })
}
