use thiserror::Error;

/// Every failure the pipeline and the studio can report.
///
/// Whether a variant is fatal is decided by the caller: the pipeline aborts on
/// anything but `Visualization`, the studio halts on `ModelLoad` at startup and
/// survives `Prediction` per request.
#[derive(Error, Debug)]
pub enum Error {
    #[error("could not load data from '{path}': {reason}")]
    DataLoad { path: String, reason: String },

    #[error("unexpected table shape: {0}")]
    DataShape(String),

    #[error("feature encoding failed: {0}")]
    FeatureEncoding(String),

    #[error("preprocessing failed: {0}")]
    Preprocessing(String),

    #[error("training failed: {0}")]
    Training(String),

    #[error("evaluation failed: {0}")]
    Evaluation(String),

    #[error("could not render loss curve: {0}")]
    Visualization(String),

    #[error("could not load model from '{path}': {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("could not save model to '{path}': {reason}")]
    ModelSave { path: String, reason: String },

    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
