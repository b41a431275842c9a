use crate::loss::loss_type::LossType;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `max_epochs`:       hard cap on full passes over the training data
/// - `batch_size`:       samples per mini-batch; use `1` for online updates
/// - `loss_type`:        which loss function to minimise
/// - `l2_penalty`:       weight-decay strength (`alpha`); 0 disables it
/// - `tol`:              minimum epoch-loss improvement that counts as progress
/// - `n_iter_no_change`: epochs without progress tolerated before stopping
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub max_epochs: usize,
    pub batch_size: usize,
    pub loss_type: LossType,
    pub l2_penalty: f64,
    pub tol: f64,
    pub n_iter_no_change: usize,
}

impl TrainConfig {
    /// Creates a `TrainConfig` without weight decay or early stopping.
    pub fn new(max_epochs: usize, batch_size: usize, loss_type: LossType) -> Self {
        TrainConfig {
            max_epochs,
            batch_size,
            loss_type,
            l2_penalty: 0.0,
            tol: 0.0,
            n_iter_no_change: usize::MAX,
        }
    }
}
