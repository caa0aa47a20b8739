//! Error types for Describo
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Describo operations
///
/// Covers image intake rejections, turn-level failures against the model
/// collaborator, and configuration problems. Turn-level variants never escape
/// the conversation engine; they are folded into the conversation state.
#[derive(Error, Debug)]
pub enum DescriboError {
    /// Upload rejected because the declared type is not an image
    #[error("Invalid file type: {0}. Please upload an image")]
    InvalidType(String),

    /// Upload rejected because it exceeds the size ceiling
    #[error("File is too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Size of the rejected file in bytes
        size: u64,
        /// Configured ceiling in bytes
        limit: u64,
    },

    /// Staged image bytes could not be read or encoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Session creation or send failed
    #[error("Request error: {0}")]
    Request(String),

    /// Failure while a response was streaming
    #[error("Stream error: {0}")]
    Stream(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// Host tool (clipboard, speech) failed
    #[error("Capability error: {0}")]
    Capability(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DescriboError {
    /// Returns true for errors raised by image intake validation
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::InvalidType(_) | Self::TooLarge { .. })
    }
}

/// Result type alias for Describo operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to downcast to [`DescriboError`] when the variant matters.
pub type Result<T> = anyhow::Result<T>;
