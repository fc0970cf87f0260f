use std::path::Path;

use anyhow::{Context, Result};
use spotargos_shared::env::ENV;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt::writer::BoxMakeWriter};

pub const LOG_ENV: &str = "SPOTARGOS_LOG";
const DEFAULT_DIRECTIVES: &str = "warn";

/// Stdout belongs to Argos, logs go to stderr or to `log_file`. Failing to set up
/// logging never prevents the menu from being printed.
pub fn init(log_file: Option<&Path>) {
    let (writer, file_err) = match log_file.map(file_writer) {
        Some(Ok(writer)) => (writer, None),
        Some(Err(err)) => (BoxMakeWriter::new(std::io::stderr), Some(err)),
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let result = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(filter(ENV.var(LOG_ENV).as_deref()))
        .try_init();

    if let Err(err) = result {
        eprintln!("Failed to initialize logging: {err}");
        return;
    }

    if let Some(err) = file_err {
        tracing::warn!(err = ?err, "Failed to open log file, logging to stderr");
    }
}

fn file_writer(path: &Path) -> Result<BoxMakeWriter> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Invalid log file path '{}'", path.display()))?;
    let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)?;

    Ok(BoxMakeWriter::new(appender))
}

fn filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}
