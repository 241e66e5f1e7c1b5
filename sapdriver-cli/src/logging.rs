//! Process-wide log sink: console at INFO, a per-run file at DEBUG.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Install the subscriber. Keep the returned guard alive until exit or the
/// tail of the file log is lost.
pub fn init(log_name: &str) -> Result<(Option<WorkerGuard>, Option<PathBuf>)> {
    let log_dir = std::env::current_dir()
        .context("Failed to resolve current directory")?
        .join("Logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_name = log_file_name(log_name, chrono::Local::now());
    let log_path = log_dir.join(&file_name);

    let console = fmt::layer()
        .with_target(true)
        .with_timer(fmt::time::ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_filter(
            EnvFilter::try_from_env("SAPDRIVER_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        );

    let (file_layer, guard, file_error) = match open_log_file(&log_path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(TIME_FORMAT.to_string()))
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    match file_error {
        None => {
            tracing::info!("Logging to {}", log_path.display());
            Ok((guard, Some(log_path)))
        }
        Some(e) => {
            tracing::error!(
                "Failed to open log file {}, logging to console only: {}",
                log_path.display(),
                e
            );
            Ok((None, None))
        }
    }
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
}

pub fn log_file_name<Tz: chrono::TimeZone>(log_name: &str, now: chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}.log", log_name, now.format("%Y-%m-%d_%H-%M-%S"))
}
