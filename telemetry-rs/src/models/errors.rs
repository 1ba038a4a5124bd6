//! Module errors

use thiserror::Error;

/// Represents the different types of errors that can occur while preparing a publish.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    /// Malformed reading, non-positive TTL or a path with illegal bytes.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Empty or unusable signing key.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// Payload could not be serialized.
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Http client could not be built.
    #[error("Client build error: {0}")]
    ClientBuild(String),

    /// Missing or malformed configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}
