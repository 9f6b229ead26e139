//! Error types shared across the crate
//!
//! Tools fail with `ExternalCallError`, crews wrap tool failures in
//! `CrewError`, and configuration parsing fails with `ConfigError`. The cache
//! layer never converts or retries errors; it propagates `ExternalCallError`
//! unchanged so a failed fetch leaves no trace in the cache.

use thiserror::Error;

/// Errors raised by the collaborator fetch functions behind the cache.
///
/// The cache layer propagates these unchanged and never stores a failed
/// result, so the next call for the same key retries immediately.
#[derive(Debug, Error)]
pub enum ExternalCallError {
    /// Network-level failure (connect error, timeout, TLS failure)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service answered with a non-success status
    #[error("Unexpected status {code} from remote service: {body}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Response body, truncated by the caller where appropriate
        body: String,
    },

    /// The response arrived but could not be interpreted
    #[error("Malformed response payload: {0}")]
    Payload(String),

    /// Missing or invalid credentials for the remote service
    #[error("Authentication failed: {0}")]
    Auth(String),
}

/// Errors surfaced by crew execution.
#[derive(Debug, Error)]
pub enum CrewError {
    /// A tool invoked by the crew failed
    #[error(transparent)]
    Tool(#[from] ExternalCallError),

    /// The requested crew name is not registered
    #[error("Unknown crew: '{0}'")]
    UnknownCrew(String),

    /// The requested agent name is not registered
    #[error("Unknown agent: '{0}'")]
    UnknownAgent(String),

    /// The crew was invoked with inputs it cannot use
    #[error("Invalid crew input: {0}")]
    InvalidInput(String),
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed
    #[error("Invalid value '{value}' for {var}: {reason}")]
    InvalidValue {
        /// Environment variable name
        var: String,
        /// The offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },
}
