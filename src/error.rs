//! Structured error types for configuration resolution.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A config file exists but is unreadable as `{groupID, path: {...}}`.
    ParseError,
    /// A non-hidden `cslrun.yaml` sits in the home directory.
    PlacementError,
    /// A filesystem operation failed.
    IoError,
    /// The process environment is missing something we need.
    EnvironmentError,
}

/// Failure raised by a stage of the resolution pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to parse config file (fix, remove, or revert): {}\n  {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error(
        "Found cslrun.yaml configuration file (without a dot) in home directory {}\n\n\
         In the home directory ONLY, use .cslrun.yaml instead (with a dot, and it should already exist).\n\
         The undotted cslrun.yaml name is reserved for project directories.",
        home.display()
    )]
    Placement { home: PathBuf },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to determine the home directory (set CSLRUN_HOME)")]
    HomeDirUnavailable,

    #[error("Unable to determine the current working directory: {0}")]
    WorkingDir(#[source] std::io::Error),
}

impl ConfigError {
    pub fn parse(path: &Path, reason: impl ToString) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Parse { .. } => ErrorCode::ParseError,
            ConfigError::Placement { .. } => ErrorCode::PlacementError,
            ConfigError::Io { .. } => ErrorCode::IoError,
            ConfigError::HomeDirUnavailable | ConfigError::WorkingDir(_) => {
                ErrorCode::EnvironmentError
            }
        }
    }

    /// The file the error is about, if there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Parse { path, .. } | ConfigError::Io { path, .. } => Some(path),
            ConfigError::Placement { home } => Some(home),
            _ => None,
        }
    }
}

/// Serializable error payload for JSON output.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl From<&ConfigError> for ErrorReport {
    fn from(err: &ConfigError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            path: err.path().map(|p| p.display().to_string()),
        }
    }
}

/// Result type for resolver operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
