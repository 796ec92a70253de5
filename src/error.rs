//! Error handling for lyriq
//!
//! One typed error enum covers the whole crate. Remote rejections carry the
//! service's own code/name/message, serialization of an empty record is a
//! caller error, and malformed JSON is reported as `Parse`. Cache write
//! failures never reach this type; they are logged where they happen.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LyriqError {
    #[error("{code} {name}: {message}")]
    Api {
        code: u16,
        name: String,
        message: String,
    },

    #[error("Cannot convert empty lyrics to {operation}")]
    EmptyContent { operation: String },

    #[error("Invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid timestamp: '{token}'")]
    InvalidTimestamp { token: String },

    #[error("Invalid challenge: {reason}")]
    InvalidChallenge { reason: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Operation cancelled by user")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("Failed to determine project directories")]
    NoProjectDirs,
}

pub type Result<T> = std::result::Result<T, LyriqError>;

impl LyriqError {
    pub fn empty_content(operation: impl Into<String>) -> Self {
        LyriqError::EmptyContent {
            operation: operation.into(),
        }
    }

    /// True for the API's "track not found" rejection, which lookups report as no result.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LyriqError::Api { code: 404, .. })
    }
}

impl From<toml::de::Error> for LyriqError {
    fn from(err: toml::de::Error) -> Self {
        LyriqError::Config(ConfigError::InvalidFormat(err))
    }
}

impl From<tokio::task::JoinError> for LyriqError {
    fn from(err: tokio::task::JoinError) -> Self {
        LyriqError::Internal(err.into())
    }
}
