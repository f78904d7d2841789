//! Error types for the online evaluator

use thiserror::Error;

/// Result type alias using the evaluator's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the evaluator
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sandbox execution error
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// Audit log error
    #[error("Audit log error: {0}")]
    Audit(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Request body too large
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

impl Error {
    /// Check if error is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::PayloadTooLarge(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<json5::Error> for Error {
    fn from(err: json5::Error) -> Self {
        Error::Config(err.to_string())
    }
}
