/// admission-nn Studio
///
/// A form-based page that asks for an applicant's scores and answers whether
/// they are eligible for admission, using the model saved by the training
/// pipeline. Served by a synchronous tiny_http server.
///
/// Run with:
///   cargo run --bin studio --release
/// Then open http://127.0.0.1:8501

mod state;
mod render;
mod routes;
mod handlers;
mod util;

use std::process::ExitCode;

use tiny_http::Server;
use tracing::{error, info};

use admission_nn::config::AppConfig;
use admission_nn::logging::init_logging;

use state::AppContext;

fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let _guard = init_logging(&config.logging, &config.logging.app_file);

    let model_path = config.artifacts.model_path.clone();
    let ctx = match AppContext::load(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(path = %model_path, error = %e, "failed to load the admission model");
            eprintln!("Could not load the admission model from {}.", model_path);
            eprintln!("Run `cargo run --release` to train and save it first.");
            return ExitCode::FAILURE;
        }
    };

    let addr = ctx.config.server.addr.clone();
    let server = match Server::http(&addr) {
        Ok(server) => server,
        Err(e) => {
            error!(addr = %addr, error = %e, "failed to bind HTTP server");
            eprintln!("Could not listen on {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!(addr = %addr, model = %model_path, converged = ctx.model.converged, "studio listening");
    println!("Admission studio running at http://{}", addr);

    for request in server.incoming_requests() {
        routes::dispatch(request, &ctx);
    }
    ExitCode::SUCCESS
}
