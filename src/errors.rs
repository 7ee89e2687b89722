//! Shared error types for the application

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for testverdict operations
#[derive(Debug, Error)]
pub enum Error {
    /// File system related errors
    #[error("File system error: {message}")]
    FileSystem {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// AI bridge errors
    #[error(transparent)]
    AiBridge(#[from] AiError),

    /// Test runner errors
    #[error("Test runner error: {0}")]
    Runner(String),

    /// Generic errors with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap an I/O error raised while touching `path`
    pub fn io_at(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::FileSystem {
            message: format!("{}: {}", path.display(), source),
            path: Some(path),
            source: Some(source),
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: self.to_string(),
        }
    }

    /// True for file-not-found style failures, the only fatal class.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::FileSystem {
                source: Some(source),
                ..
            } => source.kind() == std::io::ErrorKind::NotFound,
            Self::Io(source) => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the AI bridge collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AiError {
    /// The configured tool is not on PATH; it will not appear mid-run.
    #[error("AI tool '{command}' is not installed")]
    NotInstalled { command: String },

    #[error("AI request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("AI process failed: {message}")]
    Process { message: String },

    #[error("AI tool returned an empty response")]
    EmptyResponse,
}

impl AiError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AiError::NotInstalled { .. })
    }
}
