//! Logging configuration using tracing

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable holding the filter directives
pub const LOG_ENV: &str = "RABBITMON_LOG";

const DEFAULT_FILTER: &str = "rabbitmon=info,warn";
const LOG_FILE_NAME: &str = "rabbitmon.log";

/// Initialize logging to stderr
///
/// Log level is controlled by the `RABBITMON_LOG` environment variable.
///
/// # Examples
/// ```bash
/// RABBITMON_LOG=debug cargo test
/// RABBITMON_LOG=rabbitmon_api=trace cargo test
/// ```
pub fn init() -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_timer(local_timer()),
        )
        .try_init()
        .map_err(|e| Error::config(format!("Failed to install subscriber: {}", e)))?;

    tracing::debug!("Logging to stderr");
    Ok(())
}

/// Initialize logging to a daily rolling file in `log_dir`
pub fn init_with_dir(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_NAME);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(local_timer()),
        )
        .try_init()
        .map_err(|e| Error::config(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!("Log directory: {}", log_dir.display());
    Ok(())
}

fn env_filter() -> EnvFilter {
    // Default to info, allow override via RABBITMON_LOG
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn local_timer() -> fmt::time::ChronoLocal {
    fmt::time::ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_with_dir_creates_directory() {
        let temp = tempfile::tempdir().unwrap();
        let log_dir = temp.path().join("nested").join("logs");

        // A global subscriber may already be installed by another test; the
        // directory is created either way.
        let _ = init_with_dir(&log_dir);
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_second_init_reports_error() {
        let _ = init();
        assert!(init().is_err());
    }
}
