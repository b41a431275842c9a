/// admission-nn training pipeline
///
/// Loads the applicant table, builds features, trains and saves the model,
/// renders the loss curve and prints held-out accuracy.
///
/// Run with:
///   cargo run --release -- --data data/raw/admission.csv
/// Then serve the saved model with:
///   cargo run --bin studio --release
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use admission_nn::config::AppConfig;
use admission_nn::logging::init_logging;
use admission_nn::pipeline::orchestrator::error_chain;
use admission_nn::pipeline::{run_pipeline, AdmissionStages, PipelineOutcome, StageStatus};

#[derive(Parser, Debug)]
#[command(name = "admission-nn")]
#[command(version, about = "Train the graduate admission eligibility classifier", long_about = None)]
struct Cli {
    /// Directory holding default.toml
    #[arg(long, default_value = "config", env = "ADMISSION_CONFIG_DIR")]
    config_dir: String,

    /// Applicant CSV (overrides data.path)
    #[arg(short, long)]
    data: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AppConfig::load_from(&cli.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = cli.data {
        config.data.path = path;
    }

    let _guard = init_logging(&config.logging, &config.logging.pipeline_file);
    info!(data = %config.data.path, model = %config.artifacts.model_path, "pipeline starting");

    let mut stages = AdmissionStages::new(config);
    match run_pipeline(&mut stages) {
        PipelineOutcome::Completed(report) => {
            let eval = report.evaluation;
            info!(accuracy = eval.accuracy, "pipeline completed");
            println!("Accuracy: {:.4}", eval.accuracy);
            println!(
                "Precision: {:.4}  Recall: {:.4}  F1: {:.4}",
                eval.confusion.precision(),
                eval.confusion.recall(),
                eval.confusion.f1()
            );
            println!("Confusion matrix:\n{}", eval.confusion);
            if let StageStatus::Skipped { reason } = &report.visualization {
                println!("Loss curve not saved: {}", reason);
            }
            ExitCode::SUCCESS
        }
        PipelineOutcome::Aborted { stage, error } => {
            error!(severity = "critical", stage = %stage, error = %error_chain(&error), "pipeline terminated");
            eprintln!("Pipeline terminated during {}: {}", stage, error);
            ExitCode::FAILURE
        }
    }
}
