//! Error types for arize

use std::path::PathBuf;
use thiserror::Error;

use crate::dataframe::validation::ValidationFailure;

/// Main error type for arize operations
#[derive(Error, Debug)]
pub enum ArizeError {
    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or empty credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A call argument is missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Columns of a bulk call have different lengths
    #[error("Shape mismatch: {0}")]
    InvalidShape(String),

    /// A value cannot be converted for the wire
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Additional headers reuse reserved names
    #[error("Found invalid additional header, cannot use reserved headers named: {0}.")]
    InvalidHeaders(String),

    /// The dataframe failed validation
    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    /// Input file does not exist
    #[error("File not found: {path}")]
    FileNotFound {
        /// The missing path
        path: PathBuf,
    },

    /// Input file format cannot be read
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// Request could not be sent, or the upload was rejected
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid configuration key or value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Arrow read, write or cast failure
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON parse failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse failure
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP client failure
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

/// Result type alias for arize operations
pub type Result<T> = std::result::Result<T, ArizeError>;

impl ArizeError {
    /// Create an error for arguments of the wrong kind
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an error for columns whose lengths disagree
    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        Self::InvalidShape(msg.into())
    }

    /// Create an error for values outside their accepted domain
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}
