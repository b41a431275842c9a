use serde::{Serialize, Deserialize};

/// Statistics for one completed epoch of `train_loop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Mean training loss over the epoch, including the L2 term.
    pub train_loss: f64,
    /// Wall-clock duration of this epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Outcome of a `train_loop` run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epochs: Vec<EpochStats>,
    /// True when early stopping fired before `max_epochs`.
    pub converged: bool,
}

impl TrainReport {
    /// The loss curve: one value per completed epoch.
    pub fn loss_curve(&self) -> Vec<f64> {
        self.epochs.iter().map(|s| s.train_loss).collect()
    }
}
