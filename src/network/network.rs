use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, layers::dense::Layer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples.
    pub fn new<R: Rng + ?Sized>(
        layer_specs: Vec<(usize, usize, ActivationFunction)>,
        rng: &mut R,
    ) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation, rng))
            .collect();
        Network { layers }
    }

    /// Binary classifier: `input_size → hidden… → 1 (Sigmoid)`.
    pub fn binary_classifier<R: Rng + ?Sized>(
        input_size: usize,
        hidden: &[usize],
        hidden_activation: &ActivationFunction,
        rng: &mut R,
    ) -> Network {
        let mut specs = Vec::with_capacity(hidden.len() + 1);
        let mut fan_in = input_size;
        for &size in hidden {
            specs.push((size, fan_in, hidden_activation.clone()));
            fan_in = size;
        }
        specs.push((1, fan_in, ActivationFunction::Sigmoid));
        Network::new(specs, rng)
    }

    /// Forward pass; stores activations in each layer for backprop.
    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &mut self.layers {
            current = layer.feed_from(&current);
        }
        current
    }

    /// Forward pass without touching the backprop caches.
    pub fn predict(&self, input: &[f64]) -> Vec<f64> {
        self.layers.iter()
            .fold(input.to_vec(), |current, layer| layer.activate(&current))
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size())
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size)
    }
}
