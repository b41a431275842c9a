use std::path::PathBuf;

use admission_nn::config::AppConfig;
use admission_nn::model::AdmissionModel;
use admission_nn::Result;

/// Everything a request handler needs, built once at startup and shared by
/// reference for the life of the server.
#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub model: AdmissionModel,
    pub loss_curve_path: PathBuf,
}

impl AppContext {
    /// Loads the model artifact named by `artifacts.model_path`.
    pub fn load(config: AppConfig) -> Result<AppContext> {
        let model = AdmissionModel::load_json(&config.artifacts.model_path)?;
        let loss_curve_path = PathBuf::from(&config.artifacts.loss_curve_path);
        Ok(AppContext { config, model, loss_curve_path })
    }
}
