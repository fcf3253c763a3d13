//! Error types for the signed-update system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for signed-update operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the signed-update system
#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration keys were absent at startup
    #[error("Missing configuration: {}", keys.join(", "))]
    ConfigMissing {
        /// Names of the missing environment keys
        keys: Vec<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Secret store errors
    #[error("Secret store error: {0}")]
    SecretStore(String),

    /// The presented signature did not match the expected HMAC
    #[error("Invalid signature")]
    InvalidSignature,

    /// The request timestamp fell outside the freshness window
    #[error("Timestamp expired")]
    TimestampExpired,

    /// The request timestamp was absent or could not be interpreted
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// DNS provider errors
    #[error("DNS provider error: {0}")]
    DnsProvider(String),

    /// HTTP errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error listing missing configuration keys
    pub fn config_missing(keys: Vec<String>) -> Self {
        Self::ConfigMissing { keys }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a secret store error
    pub fn secret_store(msg: impl Into<String>) -> Self {
        Self::SecretStore(msg.into())
    }

    /// Create an invalid timestamp error
    pub fn invalid_timestamp(msg: impl Into<String>) -> Self {
        Self::InvalidTimestamp(msg.into())
    }

    /// Create a DNS provider error
    pub fn dns_provider(msg: impl Into<String>) -> Self {
        Self::DnsProvider(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// HTTP status the verifier maps this error to
    ///
    /// A signature mismatch is the only 401; everything else, including
    /// an expired timestamp, is reported as 500.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidSignature => 401,
            _ => 500,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
