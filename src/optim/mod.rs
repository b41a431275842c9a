pub mod adam;
pub mod sgd;

use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, layers::dense::Layer};

pub use adam::Adam;
pub use sgd::Sgd;

/// Applies one parameter update to a layer from its averaged gradients.
pub trait Optimizer {
    fn step(&mut self, layer_idx: usize, layer: &mut Layer, weights_grad: &Matrix, biases_grad: &Matrix);
}

/// Optimizer selection as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Sgd,
    Adam,
}

impl OptimizerKind {
    pub fn build(self, learning_rate: f64) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Sgd  => Box::new(Sgd::new(learning_rate)),
            OptimizerKind::Adam => Box::new(Adam::new(learning_rate)),
        }
    }
}
