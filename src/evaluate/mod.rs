pub mod confusion;
pub mod evaluator;

pub use confusion::ConfusionMatrix;
pub use evaluator::{evaluate_model, Evaluation};
