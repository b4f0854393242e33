//! `tracing`/`tracing-subscriber` initialization. Stdout is reserved for
//! JSON-RPC responses, so all logging goes to stderr, optionally mirrored
//! to a rolling log file.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Log file rotation period, when a log file path is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    Minutely,
    Hourly,
    Daily,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(value: LogRotation) -> Self {
        match value {
            LogRotation::Minutely => Rotation::MINUTELY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Initialize the global tracing subscriber from a `log_level` string
/// (`trace`/`debug`/`info`/`warn`/`error`) plus an optional log file path.
/// The returned [`WorkerGuard`] must be kept alive for the file writer to
/// flush; dropping it silently stops logging.
pub fn setup_logging(log_level: &str, log_path: Option<PathBuf>, rotation: LogRotation) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    match log_path {
        Some(path) => setup_file_logging(&path, env_filter, rotation),
        None => setup_stderr_logging(env_filter),
    }
}

fn setup_file_logging(log_path: &PathBuf, env_filter: EnvFilter, rotation: LogRotation) -> anyhow::Result<Option<WorkerGuard>> {
    if let Some(parent) = log_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("could not create log directory {}: {e} — falling back to stderr", parent.display());
            return setup_stderr_logging(env_filter);
        }
    }

    let appender = RollingFileAppender::builder()
        .rotation(rotation.into())
        .filename_prefix("mcp-tool-server")
        .filename_suffix("log")
        .build(log_path);

    let appender = match appender {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("log file setup failed ({e}) — falling back to stderr");
            return setup_stderr_logging(env_filter);
        }
    };

    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false).with_target(false))
        .init();
    Ok(Some(guard))
}

fn setup_stderr_logging(env_filter: EnvFilter) -> anyhow::Result<Option<WorkerGuard>> {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_ansi(true).with_target(false))
        .init();
    Ok(None)
}
