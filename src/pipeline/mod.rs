pub mod orchestrator;
pub mod stage;
pub mod stages;

pub use orchestrator::{run_pipeline, PipelineStages};
pub use stage::{PipelineOutcome, PipelineReport, Stage, StageStatus};
pub use stages::AdmissionStages;
