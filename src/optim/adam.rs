use crate::{math::matrix::Matrix, layers::dense::Layer};
use crate::optim::Optimizer;

/// First and second moment estimates for one layer's weights and biases.
struct Moments {
    m_w: Matrix,
    v_w: Matrix,
    m_b: Matrix,
    v_b: Matrix,
}

/// Adam (Kingma & Ba) with bias-corrected moment estimates.
///
/// Moment buffers are created lazily the first time a layer index is seen,
/// so one `Adam` instance must only ever drive one network.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    moments: Vec<Option<Moments>>,
    /// Per-layer update counters (bias correction).
    steps: Vec<i32>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            moments: Vec::new(),
            steps: Vec::new(),
        }
    }

    fn slot(&mut self, layer_idx: usize, layer: &Layer) -> (&mut Moments, i32) {
        if self.moments.len() <= layer_idx {
            self.moments.resize_with(layer_idx + 1, || None);
            self.steps.resize(layer_idx + 1, 0);
        }
        self.steps[layer_idx] += 1;
        let t = self.steps[layer_idx];
        let moments = self.moments[layer_idx].get_or_insert_with(|| Moments {
            m_w: Matrix::zeros(layer.weights.rows, layer.weights.cols),
            v_w: Matrix::zeros(layer.weights.rows, layer.weights.cols),
            m_b: Matrix::zeros(layer.biases.rows, layer.biases.cols),
            v_b: Matrix::zeros(layer.biases.rows, layer.biases.cols),
        });
        (moments, t)
    }
}

impl Optimizer for Adam {
    fn step(&mut self, layer_idx: usize, layer: &mut Layer, weights_grad: &Matrix, biases_grad: &Matrix) {
        let (beta1, beta2, eps, lr) = (self.beta1, self.beta2, self.epsilon, self.learning_rate);
        let (moments, t) = self.slot(layer_idx, layer);

        moments.m_w = moments.m_w.zip_map(weights_grad, |m, g| beta1 * m + (1.0 - beta1) * g);
        moments.v_w = moments.v_w.zip_map(weights_grad, |v, g| beta2 * v + (1.0 - beta2) * g * g);
        moments.m_b = moments.m_b.zip_map(biases_grad, |m, g| beta1 * m + (1.0 - beta1) * g);
        moments.v_b = moments.v_b.zip_map(biases_grad, |v, g| beta2 * v + (1.0 - beta2) * g * g);

        let correction1 = 1.0 - beta1.powi(t);
        let correction2 = 1.0 - beta2.powi(t);
        let direction = |m: f64, v: f64| (m / correction1) / ((v / correction2).sqrt() + eps);

        let w_step = moments.m_w.zip_map(&moments.v_w, direction);
        let b_step = moments.m_b.zip_map(&moments.v_b, direction);
        layer.apply_gradients(&w_step, &b_step, lr);
    }
}
