use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs the global subscriber: a console layer plus an append-only file
/// layer at `<config.dir>/<file_name>`.
///
/// `RUST_LOG` takes precedence over `config.level`. If the log directory is
/// not writable, file logging is disabled with a warning on stderr and `None`
/// is returned. Keep the returned guard alive for the whole process or
/// buffered records are lost on exit.
pub fn init_logging(config: &LoggingConfig, file_name: &str) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = match open_log_dir(&config.dir) {
        Ok(()) => {
            // `rolling::never` panics when the file cannot be created.
            let appender = tracing_appender::rolling::never(&config.dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!(
                "Warning: could not write to log directory {} ({}), file logging disabled",
                config.dir, e
            );
            (None, None)
        }
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    guard
}

fn open_log_dir(dir: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe = Path::new(dir).join(".write_test");
    std::fs::OpenOptions::new().create(true).append(true).open(&probe)?;
    let _ = std::fs::remove_file(&probe);
    Ok(())
}
