//! Logging setup for the binary

use anyhow::{Context, Result};
use std::path::PathBuf;
use textchunk_config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

const LOG_FILE_PREFIX: &str = "textchunk.log";

/// Install the global subscriber
///
/// Logs always go to stderr, and also to a daily-rotated file when a
/// directory is configured. `RUST_LOG` takes precedence over the configured
/// level. Keep the returned guards alive until the process exits or
/// buffered lines are lost.
///
/// # Errors
/// Returns an error when the log directory cannot be created or a
/// subscriber is already installed
pub fn init_logging(config: &LoggingConfig) -> Result<Vec<WorkerGuard>> {
    let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());
    let mut guards = vec![stderr_guard];

    let writer = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory '{}'", dir.display()))?;
            let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
            let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
            guards.push(file_guard);
            BoxMakeWriter::new(file_writer.and(stderr_writer))
        }
        None => BoxMakeWriter::new(stderr_writer),
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(config.directory.is_none())
        .with_env_filter(filter);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;

    Ok(guards)
}

/// Get the default log directory based on the operating system
pub fn get_default_log_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        // Windows: %LOCALAPPDATA%\textchunk\logs
        dirs::data_local_dir().map_or_else(
            || PathBuf::from("logs"),
            |local| local.join("textchunk").join("logs"),
        )
    }

    #[cfg(target_os = "macos")]
    {
        // macOS: ~/Library/Logs/textchunk
        dirs::home_dir().map_or_else(
            || PathBuf::from("logs"),
            |home| home.join("Library").join("Logs").join("textchunk"),
        )
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        // Prefer /var/log when writable, then ~/.local/share/textchunk/logs
        let system_log_dir = std::path::Path::new("/var/log/textchunk");

        if system_log_dir.exists() && is_writable(system_log_dir) {
            system_log_dir.to_path_buf()
        } else if let Some(data_dir) = dirs::data_dir() {
            data_dir.join("textchunk").join("logs")
        } else if let Some(home) = dirs::home_dir() {
            home.join(".textchunk").join("logs")
        } else {
            PathBuf::from("logs")
        }
    }
}

/// Check if a directory is writable
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn is_writable(path: &std::path::Path) -> bool {
    tempfile::tempfile_in(path).is_ok()
}
