pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;

pub mod error;
pub mod config;
pub mod logging;
pub mod data;
pub mod features;
pub mod preprocess;
pub mod model;
pub mod evaluate;
pub mod visualize;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use loss::loss_type::LossType;
pub use optim::{Optimizer, OptimizerKind};
pub use error::{Error, Result};
pub use config::AppConfig;
pub use features::encoding::{encode, Applicant, FeatureVector, Research, UniversityRating};
pub use model::admission::AdmissionModel;
pub use train::trainer::train_admission_model;
pub use evaluate::{evaluate_model, ConfusionMatrix, Evaluation};
pub use pipeline::{run_pipeline, AdmissionStages, PipelineOutcome};
