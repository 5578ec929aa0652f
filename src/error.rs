//! Unified error types for git-seed.

use std::path::PathBuf;
use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("Cannot overwrite existing directory: {0}")]
    LocalExists(PathBuf),

    #[error("Failed to {action} {path}")]
    Fs {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Upload was not confirmed")]
    Cancelled,
}

impl AppError {
    /// Wrap a filesystem error with the action and path involved
    pub fn fs(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Fs {
            action,
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Location(_) => 2,
            Self::Cancelled => 3,
            Self::LocalExists(_) | Self::Git(_) | Self::Fs { .. } | Self::Io(_) => 1,
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Parameter validation and location computation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("-{0} must not be empty")]
    Empty(&'static str),

    #[error("URL '{0}' has no scheme (expected something like http://host/path)")]
    MissingScheme(String),

    #[error("Repository name '{0}' must be a single path segment")]
    InvalidRepoName(String),

    #[error("User name '{0}' must not contain '@', ':' or '/'")]
    InvalidUser(String),
}

/// External command execution errors
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to spawn {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Git operation errors
#[derive(Debug, Error)]
pub enum GitError {
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for Git operations
pub type GitResult<T> = std::result::Result<T, GitError>;
