use std::fmt;

use crate::error::Error;
use crate::evaluate::Evaluation;

/// The five pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    BuildFeatures,
    Train,
    Visualize,
    Evaluate,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Load,
        Stage::BuildFeatures,
        Stage::Train,
        Stage::Visualize,
        Stage::Evaluate,
    ];

    /// Only a failed visualization lets the run continue.
    pub fn is_fatal(self) -> bool {
        !matches!(self, Stage::Visualize)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::BuildFeatures => "build_features",
            Stage::Train => "train",
            Stage::Visualize => "visualize",
            Stage::Evaluate => "evaluate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Done,
    /// The stage failed but the run went on; `reason` is the rendered error.
    Skipped { reason: String },
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub evaluation: Evaluation,
    pub visualization: StageStatus,
    /// Stages that were entered, in order.
    pub stages_run: Vec<Stage>,
}

#[derive(Debug)]
pub enum PipelineOutcome {
    Completed(PipelineReport),
    Aborted { stage: Stage, error: Error },
}

impl PipelineOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineOutcome::Completed(_))
    }
}
