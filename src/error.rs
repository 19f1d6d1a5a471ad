//! Error types for Yomikomi.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use thiserror::Error;

/// Error type for page source operations.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport failure or an unexpected server status.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The chapter identifier could not be resolved.
    #[error("Chapter not found: {0}")]
    ChapterNotFound(String),

    /// The response did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Returns the failure kind reported to the presentation layer.
    pub fn kind(&self) -> FailureKind {
        match self {
            SourceError::Unavailable(_) => FailureKind::SourceUnavailable,
            SourceError::ChapterNotFound(_) => FailureKind::ChapterNotFound,
            SourceError::Malformed(_) => FailureKind::SourceMalformed,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Malformed(err.to_string())
        } else {
            SourceError::Unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Malformed(err.to_string())
    }
}

/// Why a chapter load ended in the failed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SourceUnavailable,
    ChapterNotFound,
    SourceMalformed,
}

impl FailureKind {
    /// Short user-facing description.
    pub fn describe(self) -> &'static str {
        match self {
            FailureKind::SourceUnavailable => "the catalog service could not be reached",
            FailureKind::ChapterNotFound => "the chapter does not exist",
            FailureKind::SourceMalformed => "the catalog service sent an unexpected response",
        }
    }
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Result type alias using anyhow for application-level error handling.
pub type Result<T> = anyhow::Result<T>;
