//! Logging setup for the `datashelf` binary.
//!
//! Logs go to stderr and to a daily-rotating file in the platform data
//! directory. The library itself only emits `tracing` events; installing a
//! subscriber is left to the binary (or to the embedding application).
//!
//! ```no_run
//! datashelf::logging::init(false).expect("Failed to initialize logging");
//! tracing::info!("ready");
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/datashelf/logs`
/// - macOS: `~/Library/Application Support/datashelf/logs`
/// - Linux: `~/.local/share/datashelf/logs`
///
/// # Errors
///
/// Returns error if there is no data directory or the log directory cannot be created.
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;

    let log_dir = base_dir.join("datashelf").join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Default filter directive: `info`, or `debug` when `verbose` is set.
/// `RUST_LOG` always wins.
fn env_filter(verbose: bool) -> Result<EnvFilter> {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default))
        .context("Failed to create env filter")
}

/// Initializes console logging plus a rotating `datashelf.<date>.log` file.
///
/// When the log directory cannot be created, only the console layer is
/// installed and a warning is emitted.
///
/// # Errors
///
/// Returns error if the env filter or the file appender cannot be built.
pub fn init(verbose: bool) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let file_layer = match get_log_dir() {
        Ok(log_dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(10)
                .filename_prefix("datashelf")
                .filename_suffix("log")
                .build(&log_dir)
                .context("Failed to create file appender")?;
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .with_writer(appender),
            )
        }
        Err(_) => None,
    };
    let has_file_layer = file_layer.is_some();

    tracing_subscriber::registry()
        .with(env_filter(verbose)?)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if !has_file_layer {
        tracing::warn!("Log directory unavailable, logging to console only");
    }

    Ok(())
}
