//! Tracing subscriber setup.
//!
//! The terminal belongs to the feed, so logs go to a file. Follow them with
//! `tail -f` in another terminal.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum LoggingError {
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The path has no file name component.
    InvalidPath(PathBuf),
    SubscriberAlreadySet,
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryCreation { path, source } => {
                write!(f, "Failed to create log directory {}: {source}", path.display())
            }
            Self::InvalidPath(path) => write!(f, "Invalid log file path: {}", path.display()),
            Self::SubscriberAlreadySet => write!(f, "Tracing subscriber already initialized"),
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DirectoryCreation { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Filter directive: `RUST_LOG` wins, otherwise `debug` when verbose and
/// `info` when not.
fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

/// Split a log path into the directory to create and the file name,
/// creating the directory if needed.
fn prepare(log_path: &Path) -> Result<(&Path, &str), LoggingError> {
    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    let directory = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory).map_err(|source| LoggingError::DirectoryCreation {
        path: directory.to_path_buf(),
        source,
    })?;
    Ok((directory, file_name))
}

/// Install a file-backed fmt subscriber. Fails if one is already installed.
pub fn init(log_path: &Path, verbose: bool) -> Result<(), LoggingError> {
    let (directory, file_name) = prepare(log_path)?;
    let file_appender = tracing_appender::rolling::never(directory, file_name);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(file_appender)
        .with_ansi(false)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}
