use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// A fully connected layer: `a = σ(x·W + b)`.
///
/// Only the parameters and the activation are persisted; the cached
/// activations used by backprop are rebuilt on the next forward pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub size: usize,
    #[serde(skip)]
    pub neurons: Matrix,
    #[serde(skip)]
    pre_neurons: Matrix,  // pre-activation values (z = Wx + b) needed for correct derivative
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction
}

impl Layer {
    /// Weights are drawn from `rng` (He or Xavier depending on the
    /// activation); biases start at zero.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        let weights = if activation.prefers_he_init() {
            Matrix::he(input_size, size, rng)
        } else {
            Matrix::xavier(input_size, size, rng)
        };

        Layer {
            size,
            neurons: Matrix::zeros(1, size),
            pre_neurons: Matrix::zeros(1, size),
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation
        }
    }

    /// Number of inputs this layer expects.
    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Training-time forward step; caches z and a for `compute_gradients`.
    pub fn feed_from(&mut self, input: &[f64]) -> Vec<f64> {
        let z = &Matrix::row(input) * &self.weights + self.biases.clone();
        let a = z.map(|x| self.activator.function(x));
        self.pre_neurons = z;
        self.neurons = a.clone();
        a.data.into_iter().next().unwrap_or_default()
    }

    /// Inference-time forward step; leaves the layer untouched.
    pub fn activate(&self, input: &[f64]) -> Vec<f64> {
        let z = &Matrix::row(input) * &self.weights + self.biases.clone();
        z.data.into_iter().next().unwrap_or_default()
            .into_iter()
            .map(|x| self.activator.function(x))
            .collect()
    }

    /// Computes gradient adjustments. Returns (weights_grad, biases_grad).
    /// `next_layer_delta` is ∂L/∂a for this layer (error in activation space).
    pub fn compute_gradients(
        &self,
        next_layer_delta: &Matrix,
        inputs: &Matrix,
    ) -> (Matrix, Matrix) {
        // Use pre-activation z so that derivative(z) = σ'(z) is computed correctly
        let act_derivative = self.pre_neurons.map(|x| self.activator.derivative(x));
        // δ = error ⊙ σ'(z)
        self.gradients_from_pre_delta(next_layer_delta.hadamard(&act_derivative), inputs)
    }

    /// Same as `compute_gradients` when `layer_delta` is already ∂L/∂z.
    pub fn gradients_from_pre_delta(&self, layer_delta: Matrix, inputs: &Matrix) -> (Matrix, Matrix) {
        let weights_adjustment = &inputs.transpose() * &layer_delta;
        (weights_adjustment, layer_delta)
    }

    /// Moves the parameters against `weights_step` / `biases_step` scaled by lr.
    pub fn apply_gradients(&mut self, weights_step: &Matrix, biases_step: &Matrix, lr: f64) {
        self.weights = self.weights.zip_map(weights_step, |w, g| w - lr * g);
        self.biases = self.biases.zip_map(biases_step, |b, g| b - lr * g);
    }
}
