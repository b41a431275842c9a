use tracing::info;

use crate::config::AppConfig;
use crate::data::{load_table, RawTable};
use crate::error::Result;
use crate::evaluate::{evaluate_model, Evaluation};
use crate::features::{build_features, FeatureSet};
use crate::model::AdmissionModel;
use crate::pipeline::orchestrator::PipelineStages;
use crate::train::{train_admission_model, TrainOutcome};
use crate::visualize::save_loss_curve;

/// Production stages, driven entirely by `config`.
#[derive(Debug, Clone)]
pub struct AdmissionStages {
    pub config: AppConfig,
}

impl AdmissionStages {
    pub fn new(config: AppConfig) -> Self {
        AdmissionStages { config }
    }
}

impl PipelineStages for AdmissionStages {
    fn load(&mut self) -> Result<RawTable> {
        let table = load_table(&self.config.data.path)?;
        info!(path = %self.config.data.path, rows = table.len(), columns = table.headers.len(), "data loaded");
        Ok(table)
    }

    fn build_features(&mut self, table: &RawTable) -> Result<FeatureSet> {
        let set = build_features(table, self.config.data.label_threshold)?;
        let positives = set.targets.iter().filter(|&&y| y == 1.0).count();
        info!(rows = set.len(), positives, "features built");
        Ok(set)
    }

    /// Fits the model and writes the artifact to `artifacts.model_path`.
    fn train(&mut self, features: &FeatureSet) -> Result<TrainOutcome> {
        let outcome = train_admission_model(&features.features, &features.targets, &self.config.training)?;
        outcome.model.save_json(&self.config.artifacts.model_path)?;
        info!(path = %self.config.artifacts.model_path, "model saved");
        Ok(outcome)
    }

    fn visualize(&mut self, model: &AdmissionModel) -> Result<()> {
        save_loss_curve(&model.loss_curve, &self.config.artifacts.loss_curve_path)?;
        info!(path = %self.config.artifacts.loss_curve_path, "loss curve saved");
        Ok(())
    }

    fn evaluate(&mut self, trained: &TrainOutcome) -> Result<Evaluation> {
        evaluate_model(&trained.model, &trained.test_features, &trained.test_labels)
    }
}
