use std::error::Error as StdError;

use tracing::{error, info, warn};

use crate::data::RawTable;
use crate::error::{Error, Result};
use crate::evaluate::Evaluation;
use crate::features::FeatureSet;
use crate::model::AdmissionModel;
use crate::pipeline::stage::{PipelineOutcome, PipelineReport, Stage, StageStatus};
use crate::train::TrainOutcome;

/// The work behind each pipeline stage.
///
/// [`run_pipeline`] owns ordering, logging and fatality; implementors only do
/// the work and report failure through `Result`.
pub trait PipelineStages {
    fn load(&mut self) -> Result<RawTable>;
    fn build_features(&mut self, table: &RawTable) -> Result<FeatureSet>;
    fn train(&mut self, features: &FeatureSet) -> Result<TrainOutcome>;
    fn visualize(&mut self, model: &AdmissionModel) -> Result<()>;
    fn evaluate(&mut self, trained: &TrainOutcome) -> Result<Evaluation>;
}

/// Runs `Load → BuildFeatures → Train → Visualize → Evaluate`.
///
/// A failure in a stage whose [`Stage::is_fatal`] is false (Visualize) is
/// logged as a warning and recorded as [`StageStatus::Skipped`]; any other
/// failure aborts the run and no later stage is entered. Nothing is retried.
pub fn run_pipeline<S: PipelineStages + ?Sized>(stages: &mut S) -> PipelineOutcome {
    let mut stages_run = Vec::with_capacity(Stage::ALL.len());

    // Logs start, finish and failure at the severity the stage calls for.
    macro_rules! attempt {
        ($stage:expr, $call:expr) => {{
            let stage: Stage = $stage;
            stages_run.push(stage);
            info!(stage = %stage, "stage started");
            let result = $call;
            match &result {
                Ok(_) => info!(stage = %stage, "stage finished"),
                Err(err) if stage.is_fatal() => {
                    error!(stage = %stage, error = %error_chain(err), "{}", failure_message(stage))
                }
                Err(err) => {
                    warn!(stage = %stage, error = %error_chain(err), "{}; continuing", failure_message(stage))
                }
            }
            result
        }};
    }

    macro_rules! fatal {
        ($stage:expr, $call:expr) => {
            match attempt!($stage, $call) {
                Ok(value) => value,
                Err(error) => return PipelineOutcome::Aborted { stage: $stage, error },
            }
        };
    }

    let table = fatal!(Stage::Load, stages.load());
    let features = fatal!(Stage::BuildFeatures, stages.build_features(&table));
    let trained = fatal!(Stage::Train, stages.train(&features));

    let visualization = match attempt!(Stage::Visualize, stages.visualize(&trained.model)) {
        Ok(()) => StageStatus::Done,
        Err(error) if Stage::Visualize.is_fatal() => {
            return PipelineOutcome::Aborted { stage: Stage::Visualize, error };
        }
        Err(err) => StageStatus::Skipped { reason: error_chain(&err) },
    };

    let evaluation = fatal!(Stage::Evaluate, stages.evaluate(&trained));

    PipelineOutcome::Completed(PipelineReport { evaluation, visualization, stages_run })
}

fn failure_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Load => "failed to load the applicant data",
        Stage::BuildFeatures => "failed to build features",
        Stage::Train => "failed to train the model",
        Stage::Visualize => "failed to render the loss curve",
        Stage::Evaluate => "failed to evaluate the model",
    }
}

/// `err` followed by each of its sources, joined with `": "`.
pub fn error_chain(err: &Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::evaluate::ConfusionMatrix;
    use crate::features::encoding::FEATURE_COUNT;
    use crate::network::Network;
    use crate::preprocess::scaler::{Scaler, ScalerKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Records which stages ran; `fail` names the stage that errors.
    struct Scripted {
        fail: Option<Stage>,
        calls: Vec<Stage>,
    }

    impl Scripted {
        fn failing(stage: Option<Stage>) -> Self {
            Scripted { fail: stage, calls: Vec::new() }
        }

        fn step(&mut self, stage: Stage) -> Result<()> {
            self.calls.push(stage);
            if self.fail == Some(stage) {
                let err = match stage {
                    Stage::Visualize => Error::Visualization("disk full".into()),
                    Stage::Train => Error::Training("loss diverged".into()),
                    Stage::Evaluate => Error::Evaluation("no held-out rows".into()),
                    _ => Error::DataShape("scripted".into()),
                };
                return Err(err);
            }
            Ok(())
        }
    }

    impl PipelineStages for Scripted {
        fn load(&mut self) -> Result<RawTable> {
            self.step(Stage::Load)?;
            Ok(RawTable { headers: vec!["gre".into()], rows: vec![vec!["300".into()]] })
        }

        fn build_features(&mut self, _table: &RawTable) -> Result<FeatureSet> {
            self.step(Stage::BuildFeatures)?;
            Ok(FeatureSet { features: Vec::new(), targets: Vec::new() })
        }

        fn train(&mut self, _features: &FeatureSet) -> Result<TrainOutcome> {
            self.step(Stage::Train)?;
            let network = Network::binary_classifier(FEATURE_COUNT, &[2], &ActivationFunction::ReLU, &mut ChaCha8Rng::seed_from_u64(5));
            let scaler = Scaler {
                kind: ScalerKind::Standard,
                offset: vec![0.0; FEATURE_COUNT],
                scale: vec![1.0; FEATURE_COUNT],
            };
            Ok(TrainOutcome {
                model: AdmissionModel::new(network, scaler, vec![0.7, 0.6], false),
                test_features: Vec::new(),
                test_labels: Vec::new(),
            })
        }

        fn visualize(&mut self, _model: &AdmissionModel) -> Result<()> {
            self.step(Stage::Visualize)
        }

        fn evaluate(&mut self, _trained: &TrainOutcome) -> Result<Evaluation> {
            self.step(Stage::Evaluate)?;
            let confusion = ConfusionMatrix { tn: 3, fp: 1, fn_: 0, tp: 4 };
            Ok(Evaluation { accuracy: confusion.accuracy(), confusion })
        }
    }

    #[test]
    fn all_stages_run_in_order() {
        let mut stages = Scripted::failing(None);
        let outcome = run_pipeline(&mut stages);
        assert_eq!(stages.calls, Stage::ALL.to_vec());
        match outcome {
            PipelineOutcome::Completed(report) => {
                assert_eq!(report.visualization, StageStatus::Done);
                assert_eq!(report.stages_run, Stage::ALL.to_vec());
                assert_eq!(report.evaluation.accuracy, 7.0 / 8.0);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn visualization_failure_is_not_fatal() {
        let mut stages = Scripted::failing(Some(Stage::Visualize));
        let outcome = run_pipeline(&mut stages);
        assert!(stages.calls.contains(&Stage::Evaluate));
        match outcome {
            PipelineOutcome::Completed(report) => match report.visualization {
                StageStatus::Skipped { reason } => assert!(reason.contains("disk full")),
                StageStatus::Done => panic!("visualization should be skipped"),
            },
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn training_failure_aborts_before_evaluation() {
        let mut stages = Scripted::failing(Some(Stage::Train));
        let outcome = run_pipeline(&mut stages);
        assert_eq!(stages.calls, vec![Stage::Load, Stage::BuildFeatures, Stage::Train]);
        match outcome {
            PipelineOutcome::Aborted { stage, error } => {
                assert_eq!(stage, Stage::Train);
                assert!(matches!(error, Error::Training(_)));
            }
            other => panic!("expected abort, got {:?}", other),
        }
    }

    #[test]
    fn evaluation_failure_aborts() {
        let mut stages = Scripted::failing(Some(Stage::Evaluate));
        let outcome = run_pipeline(&mut stages);
        assert_eq!(stages.calls, Stage::ALL.to_vec());
        match outcome {
            PipelineOutcome::Aborted { stage, error } => {
                assert_eq!(stage, Stage::Evaluate);
                assert!(matches!(error, Error::Evaluation(_)));
            }
            other => panic!("expected abort, got {:?}", other),
        }
    }

    #[test]
    fn load_failure_runs_nothing_else() {
        let mut stages = Scripted::failing(Some(Stage::Load));
        let outcome = run_pipeline(&mut stages);
        assert_eq!(stages.calls, vec![Stage::Load]);
        assert!(!outcome.is_completed());
    }

    #[test]
    fn only_visualize_is_non_fatal() {
        let non_fatal: Vec<Stage> = Stage::ALL.iter().copied().filter(|s| !s.is_fatal()).collect();
        assert_eq!(non_fatal, vec![Stage::Visualize]);
    }
}
