//! WolfHA Error Types

use thiserror::Error;

/// Result type alias for WolfHA operations
pub type Result<T> = std::result::Result<T, Error>;

/// WolfHA error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // API errors
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Form errors
    #[error("Submission already in progress")]
    SubmitInProgress,

    #[error("Unknown form field: {0}")]
    UnknownField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },

    #[error("Field {0} is read-only in edit mode")]
    ReadOnlyField(String),

    #[error("Form has already been submitted")]
    AlreadySubmitted,

    #[error("Key generation is only available for a new Active instance")]
    KeyGenerationUnavailable,

    #[error("The shared key of a new Active instance must be generated")]
    GeneratedKeyRequired,

    #[error("Only the form of an existing configuration can be cancelled")]
    CancelUnavailable,

    // Workflow errors
    #[error("No configuration ID available for {0}")]
    MissingConfigId(&'static str),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if this error is a transient transport failure
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
