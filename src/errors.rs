/*!
 * Error types for the article translator.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors a translation backend can report for a single request.
///
/// The pipeline driver picks its retry policy from the variant, so a
/// backend must never report a rate limit as a generic failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// The backend refused the request because its request quota is exhausted
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// The backend answered with an error status or a structured error body
    #[error("Backend responded with error: {status} - {message}")]
    BackendError {
        /// HTTP status code (0 when the request never reached the backend)
        status: u16,
        /// Error message from the backend or the transport
        message: String,
    },

    /// The response body could not be parsed
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The run was cancelled while the request was pending
    #[error("Translation cancelled")]
    Cancelled,
}

impl TranslationError {
    /// Build a backend error from a transport failure that never got a status
    pub fn transport(message: impl Into<String>) -> Self {
        Self::BackendError {
            status: 0,
            message: message.into(),
        }
    }

    /// Whether the driver should cool down and retry
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }

    /// Whether the failure is likely to clear up on its own
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Timeout)
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Malformed(error.to_string())
        } else if let Some(status) = error.status() {
            if status.as_u16() == 429 {
                Self::RateLimited(error.to_string())
            } else {
                Self::BackendError {
                    status: status.as_u16(),
                    message: error.to_string(),
                }
            }
        } else {
            Self::transport(error.to_string())
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// The input file is missing or unreadable; the run aborts before any work
    #[error("Fatal input error: {0}")]
    FatalInput(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing or reading a checkpoint failed
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::File(format!("JSON error: {}", error))
    }
}
