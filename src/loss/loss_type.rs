use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::loss::{bce::BceLoss, mse::MseLoss};

/// Selects which loss function the training loop minimises.
///
/// - `BinaryCrossEntropy`: log-loss; pair with a Sigmoid output.
/// - `Mse`:                mean-squared error on the output probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    BinaryCrossEntropy,
    Mse,
}

impl LossType {
    /// Scalar loss for one sample.
    pub fn loss(self, predicted: &[f64], expected: &[f64]) -> f64 {
        match self {
            LossType::BinaryCrossEntropy => BceLoss::loss(predicted, expected),
            LossType::Mse                => MseLoss::loss(predicted, expected),
        }
    }

    /// Per-output gradient ∂L/∂a for one sample.
    pub fn derivative(self, predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        match self {
            LossType::BinaryCrossEntropy => BceLoss::derivative(predicted, expected),
            LossType::Mse                => MseLoss::derivative(predicted, expected),
        }
    }

    /// ∂L/∂z for an output layer whose activation cancels against the loss.
    ///
    /// Sigmoid with BCE gives `p - y`, which stays exact when the sigmoid
    /// saturates. `None` means the caller must chain ∂L/∂a through σ'(z).
    pub fn fused_output_delta(
        self,
        activation: &ActivationFunction,
        predicted: &[f64],
        expected: &[f64],
    ) -> Option<Vec<f64>> {
        match (self, activation) {
            (LossType::BinaryCrossEntropy, ActivationFunction::Sigmoid) => Some(
                predicted.iter().zip(expected.iter()).map(|(p, y)| p - y).collect(),
            ),
            _ => None,
        }
    }
}
