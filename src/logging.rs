use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

const DEFAULT_DIRECTIVE: &str = "rewards_quality=info";

/// Initializes console logging on stderr, plus daily-rotated JSON file logs
/// when enabled. Stdout stays reserved for the report.
///
/// The returned guard must be held until exit so buffered file logs flush.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = if config.file_output {
        match fs::create_dir_all(&config.directory) {
            Ok(()) => {
                let file_appender =
                    tracing_appender::rolling::daily(&config.directory, "rewards-quality.log");
                let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
                let layer = fmt::layer().json().with_writer(non_blocking_writer);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!(
                    "Could not create log directory {}: {}; file logging disabled",
                    config.directory.display(),
                    e
                );
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}
