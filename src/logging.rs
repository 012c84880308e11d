//! Tracing setup: stderr by default, or a time-rotated log file.

use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::Path;

use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::{LogRotation, LoggingConfig};

const TIMESTAMP_FORMAT: &str = "%d-%b-%y %H:%M:%S";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("log file {path} has no file name")]
    FileName { path: String },
    #[error("failed to open log file: {0}")]
    Appender(#[from] InitError),
    #[error("failed to install log subscriber: {0}")]
    Subscriber(#[source] Box<dyn StdError + Send + Sync>),
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_ascii_lowercase()));

    let (writer, ansi) = match &config.file {
        Some(path) => (BoxMakeWriter::new(file_appender(path, config)?), false),
        None => (BoxMakeWriter::new(io::stderr), io::stderr().is_terminal()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(ansi)
        .with_writer(writer)
        .try_init()
        .map_err(LoggingError::Subscriber)
}

/// Rolling appender for `path`. `logs/pincode.log` with daily rotation writes
/// `logs/pincode.<date>.log`; at most `backups` files are kept.
pub fn file_appender(path: &Path, config: &LoggingConfig) -> Result<RollingFileAppender, LoggingError> {
    let prefix = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| LoggingError::FileName {
            path: path.display().to_string(),
        })?;
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation(config.rotation))
        .max_log_files(config.backups)
        .filename_prefix(prefix);
    if let Some(extension) = path.extension() {
        builder = builder.filename_suffix(extension.to_string_lossy().into_owned());
    }
    Ok(builder.build(directory)?)
}

fn rotation(rotation: LogRotation) -> Rotation {
    match rotation {
        LogRotation::Minutely => Rotation::MINUTELY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Never => Rotation::NEVER,
    }
}
