use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::activation::activation::ActivationFunction;
use crate::error::Result;
use crate::loss::loss_type::LossType;
use crate::optim::OptimizerKind;
use crate::preprocess::scaler::ScalerKind;

/// Top-level configuration shared by the pipeline and the studio.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data: DataConfig,
    pub training: TrainingConfig,
    pub artifacts: ArtifactConfig,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// CSV with the raw applicant table.
    pub path: String,
    /// Admission outcomes at or above this value are the positive class.
    pub label_threshold: f64,
}

/// Hyperparameters for the admission classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation, in (0, 1).
    pub test_ratio: f64,
    /// Seeds the split, the weight initialisation and the per-epoch shuffle.
    pub seed: u64,
    /// Neuron count of every hidden layer, input side first.
    pub hidden_layers: Vec<usize>,
    pub hidden_activation: ActivationFunction,
    pub optimizer: OptimizerKind,
    pub loss: LossType,
    pub learning_rate: f64,
    pub batch_size: usize,
    /// Hard cap on epochs.
    pub max_iter: usize,
    /// Minimum loss improvement that resets the no-change counter.
    pub tol: f64,
    pub n_iter_no_change: usize,
    /// L2 penalty on the weights.
    pub alpha: f64,
    pub scaler: ScalerKind,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            test_ratio: 0.2,
            seed: 123,
            hidden_layers: vec![3],
            hidden_activation: ActivationFunction::ReLU,
            optimizer: OptimizerKind::Adam,
            loss: LossType::BinaryCrossEntropy,
            learning_rate: 0.001,
            batch_size: 50,
            max_iter: 200,
            tol: 1e-4,
            n_iter_no_change: 10,
            alpha: 1e-4,
            scaler: ScalerKind::Standard,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    pub model_path: String,
    pub loss_curve_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: String,
    pub pipeline_file: String,
    pub app_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
}

impl AppConfig {
    /// Loads configuration from the `config/` directory.
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    /// Loads configuration from a specific directory.
    ///
    /// Precedence, lowest first: built-in defaults, `<dir>/default.toml`,
    /// `ADMISSION__SECTION__KEY` environment variables.
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref();
        let training = TrainingConfig::default();

        let builder = Config::builder()
            .set_default("data.path", "data/raw/admission.csv")?
            .set_default("data.label_threshold", 0.8)?
            .set_default("training.test_ratio", training.test_ratio)?
            .set_default("training.seed", training.seed as i64)?
            .set_default("training.hidden_layers", vec![3_i64])?
            .set_default("training.hidden_activation", "relu")?
            .set_default("training.optimizer", "adam")?
            .set_default("training.loss", "binary_cross_entropy")?
            .set_default("training.learning_rate", training.learning_rate)?
            .set_default("training.batch_size", training.batch_size as i64)?
            .set_default("training.max_iter", training.max_iter as i64)?
            .set_default("training.tol", training.tol)?
            .set_default("training.n_iter_no_change", training.n_iter_no_change as i64)?
            .set_default("training.alpha", training.alpha)?
            .set_default("training.scaler", "standard")?
            .set_default("artifacts.model_path", "models/admission_model.json")?
            .set_default("artifacts.loss_curve_path", "loss_curve.png")?
            .set_default("logging.level", "info")?
            .set_default("logging.dir", "logs")?
            .set_default("logging.pipeline_file", "pipeline.log")?
            .set_default("logging.app_file", "app.log")?
            .set_default("server.addr", "127.0.0.1:8501")?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                Environment::with_prefix("ADMISSION")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder.build()?.try_deserialize()?)
    }
}
