use std::fmt;

use serde::{Deserialize, Serialize};

/// 2×2 confusion counts. Rows are the true class, columns the predicted
/// class, class 0 first: `[[tn, fp], [fn, tp]]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn record(&mut self, truth: u8, predicted: u8) {
        match (truth, predicted) {
            (0, 0) => self.tn += 1,
            (0, _) => self.fp += 1,
            (_, 0) => self.fn_ += 1,
            _ => self.tp += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    pub fn correct(&self) -> usize {
        self.tn + self.tp
    }

    /// Fraction on the diagonal; 0 for an empty matrix.
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }

    /// Counts as `[[tn, fp], [fn, tp]]`.
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self.as_rows().iter().flatten().map(|v| v.to_string().len()).max().unwrap_or(1);
        write!(
            f,
            "[[{:>w$} {:>w$}]\n [{:>w$} {:>w$}]]",
            self.tn, self.fp, self.fn_, self.tp,
            w = w
        )
    }
}
