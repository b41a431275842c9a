use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::Optimizer;
use crate::train::epoch_stats::{EpochStats, TrainReport};
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` with mini-batch gradient descent until early stopping
/// fires or `config.max_epochs` is reached.
///
/// # Arguments
/// - `network`:      mutable reference to the network; modified in place
/// - `train_inputs`: training samples, each a `Vec<f64>` of length `input_size`
/// - `train_labels`: corresponding targets, same length as `train_inputs`
/// - `optimizer`:    parameter update rule (SGD, Adam)
/// - `config`:       hyperparameters and stopping rule
/// - `rng`:          drives the per-epoch shuffle
///
/// # Early termination
/// After each epoch the loss is compared with the best seen so far. An epoch
/// that fails to beat it by `config.tol` increments a counter (any other epoch
/// resets it); once the counter exceeds `config.n_iter_no_change` the run is
/// reported as converged.
///
/// # Errors
/// `Error::Training` for empty or mismatched inputs, a zero batch size, or a
/// loss that stops being finite.
pub fn train_loop<R: Rng + ?Sized>(
    network: &mut Network,
    train_inputs: &[Vec<f64>],
    train_labels: &[Vec<f64>],
    optimizer: &mut dyn Optimizer,
    config: &TrainConfig,
    rng: &mut R,
) -> Result<TrainReport> {
    if train_inputs.is_empty() {
        return Err(Error::Training("no training samples".into()));
    }
    if train_inputs.len() != train_labels.len() {
        return Err(Error::Training(format!(
            "{} training samples but {} labels",
            train_inputs.len(),
            train_labels.len()
        )));
    }
    if config.batch_size == 0 {
        return Err(Error::Training("batch size must be at least 1".into()));
    }

    let mut epochs = Vec::with_capacity(config.max_epochs);
    let mut best_loss = f64::INFINITY;
    let mut no_improvement = 0usize;
    let mut converged = false;

    for epoch in 1..=config.max_epochs {
        let t_start = Instant::now();

        // ── One full pass over the training data ───────────────────────────
        let train_loss = run_one_epoch(network, train_inputs, train_labels, optimizer, config, rng);
        if !train_loss.is_finite() {
            return Err(Error::Training(format!("loss diverged at epoch {}", epoch)));
        }

        let elapsed_ms = t_start.elapsed().as_millis() as u64;
        epochs.push(EpochStats { epoch, train_loss, elapsed_ms });
        debug!(epoch, loss = train_loss, elapsed_ms, "epoch finished");

        // ── Stopping rule ─────────────────────────────────────────────────
        if train_loss > best_loss - config.tol {
            no_improvement += 1;
        } else {
            no_improvement = 0;
        }
        if train_loss < best_loss {
            best_loss = train_loss;
        }
        if no_improvement > config.n_iter_no_change {
            converged = true;
            break;
        }
    }

    Ok(TrainReport { epochs, converged })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Runs one full epoch of mini-batch updates over the training data.
/// Returns the mean loss per sample, L2 term included.
fn run_one_epoch<R: Rng + ?Sized>(
    network: &mut Network,
    inputs: &[Vec<f64>],
    labels: &[Vec<f64>],
    optimizer: &mut dyn Optimizer,
    config: &TrainConfig,
    rng: &mut R,
) -> f64 {
    let n = inputs.len();
    let mut total_loss = 0.0;

    // Shuffle sample order each epoch.
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    for batch_start in (0..n).step_by(config.batch_size) {
        let batch_end = (batch_start + config.batch_size).min(n);
        let actual_batch_size = (batch_end - batch_start) as f64;

        // Zero-initialize accumulated gradient storage.
        let mut acc_grads: Vec<(Matrix, Matrix)> = network.layers.iter()
            .map(|layer| (
                Matrix::zeros(layer.weights.rows, layer.weights.cols),
                Matrix::zeros(layer.biases.rows, layer.biases.cols),
            ))
            .collect();

        // Accumulate gradients over the mini-batch.
        for &idx in &indices[batch_start..batch_end] {
            let input    = &inputs[idx];
            let expected = &labels[idx];

            let output = network.forward(input);

            total_loss += config.loss_type.loss(&output, expected);

            let last = network.layers.len() - 1;
            let fused = config.loss_type
                .fused_output_delta(&network.layers[last].activator, &output, expected);
            let output_is_pre_delta = fused.is_some();
            let error = fused.unwrap_or_else(|| config.loss_type.derivative(&output, expected));
            let mut delta = Matrix::from_data(vec![error]);

            // Backward pass.
            for i in (0..=last).rev() {
                let input_for_layer = if i == 0 {
                    Matrix::row(input)
                } else {
                    network.layers[i - 1].neurons.clone()
                };

                let (w_grad, b_grad) = if i == last && output_is_pre_delta {
                    network.layers[i].gradients_from_pre_delta(delta.clone(), &input_for_layer)
                } else {
                    network.layers[i].compute_gradients(&delta, &input_for_layer)
                };

                if i > 0 {
                    delta = &b_grad * &network.layers[i].weights.transpose();
                }

                acc_grads[i].0 = acc_grads[i].0.clone() + w_grad;
                acc_grads[i].1 = acc_grads[i].1.clone() + b_grad;
            }
        }

        // L2 penalty: 0.5·α·‖W‖² per batch, gradient α·W / batch.
        if config.l2_penalty > 0.0 {
            let sq: f64 = network.layers.iter().map(|l| l.weights.squared_norm()).sum();
            total_loss += 0.5 * config.l2_penalty * sq;
        }

        // Average and apply.
        let inv_batch = 1.0 / actual_batch_size;
        let alpha = config.l2_penalty;
        for (i, (w_acc, b_acc)) in acc_grads.into_iter().enumerate() {
            let w_avg = w_acc.zip_map(&network.layers[i].weights, |g, w| (g + alpha * w) * inv_batch);
            let b_avg = b_acc.map(|x| x * inv_batch);
            optimizer.step(i, &mut network.layers[i], &w_avg, &b_avg);
        }
    }

    total_loss / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::loss::loss_type::LossType;
    use crate::optim::{Adam, Sgd};
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn xor() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let inputs = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let labels = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
        (inputs, labels)
    }

    #[test]
    fn learns_xor() {
        let (inputs, labels) = xor();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut net = Network::binary_classifier(2, &[8], &ActivationFunction::Tanh, &mut rng);
        let mut adam = Adam::new(0.05);
        let config = TrainConfig::new(1500, 4, LossType::BinaryCrossEntropy);

        let report = train_loop(&mut net, &inputs, &labels, &mut adam, &config, &mut rng).unwrap();
        let curve = report.loss_curve();
        assert!(curve.last().unwrap() < curve.first().unwrap());

        for (input, label) in inputs.iter().zip(labels.iter()) {
            let p = net.predict(input)[0];
            assert_eq!(if p >= 0.5 { 1.0 } else { 0.0 }, label[0], "input {:?} -> {}", input, p);
        }
    }

    #[test]
    fn plateau_triggers_early_stop() {
        let (inputs, labels) = xor();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut net = Network::binary_classifier(2, &[2], &ActivationFunction::ReLU, &mut rng);
        // A zero learning rate never improves, so the run stops after
        // n_iter_no_change + 2 epochs (the first epoch sets the baseline).
        let mut sgd = Sgd::new(0.0);
        let mut config = TrainConfig::new(100, 2, LossType::BinaryCrossEntropy);
        config.tol = 1e-4;
        config.n_iter_no_change = 3;

        let report = train_loop(&mut net, &inputs, &labels, &mut sgd, &config, &mut rng).unwrap();
        assert!(report.converged);
        assert_eq!(report.epochs.len(), 5);
    }

    #[test]
    fn hitting_the_cap_is_not_convergence() {
        let (inputs, labels) = xor();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut net = Network::binary_classifier(2, &[4], &ActivationFunction::ReLU, &mut rng);
        let mut sgd = Sgd::new(0.1);
        let config = TrainConfig::new(3, 4, LossType::Mse);

        let report = train_loop(&mut net, &inputs, &labels, &mut sgd, &config, &mut rng).unwrap();
        assert!(!report.converged);
        assert_eq!(report.epochs.len(), 3);
        assert_eq!(report.epochs[2].epoch, 3);
    }

    #[test]
    fn saturated_sigmoid_still_learns() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut net = Network::binary_classifier(2, &[2], &ActivationFunction::Identity, &mut rng);
        // Output is exactly 1.0 for every input, while the label says 0.
        net.layers[1].biases = Matrix::from_data(vec![vec![800.0]]);
        assert_eq!(net.predict(&[1.0, 1.0])[0], 1.0);

        let mut sgd = Sgd::new(0.1);
        let config = TrainConfig::new(1, 1, LossType::BinaryCrossEntropy);
        train_loop(&mut net, &[vec![1.0, 1.0]], &[vec![0.0]], &mut sgd, &config, &mut rng).unwrap();

        // Bias gradient is p - y = 1.
        assert_abs_diff_eq!(net.layers[1].biases.data[0][0], 799.9, epsilon = 1e-9);
    }

    #[test]
    fn rejects_empty_and_mismatched_data() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut net = Network::binary_classifier(2, &[2], &ActivationFunction::ReLU, &mut rng);
        let mut sgd = Sgd::new(0.1);
        let config = TrainConfig::new(1, 1, LossType::Mse);

        let err = train_loop(&mut net, &[], &[], &mut sgd, &config, &mut rng).unwrap_err();
        assert!(matches!(err, Error::Training(_)));
        let err = train_loop(&mut net, &[vec![0.0, 1.0]], &[], &mut sgd, &config, &mut rng).unwrap_err();
        assert!(matches!(err, Error::Training(_)));
    }
}
