/*!
 * Error types for the seriloc application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when working with the generation backend API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether a retry with backoff is worth attempting
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_)
                | Self::ConnectionError(_)
                | Self::RateLimitExceeded(_)
                | Self::ApiError { status_code: 429 | 500..=599, .. }
        )
    }
}

/// Errors that can occur during episode splitting
#[derive(Error, Debug)]
pub enum SplitError {
    /// A separator pattern could not be compiled or lacks a capturing group
    #[error("Invalid separator pattern '{name}': {reason}")]
    InvalidPattern {
        /// Symbolic pattern name
        name: String,
        /// Why the pattern was rejected
        reason: String
    },

    /// The manuscript text was empty
    #[error("Manuscript text is empty")]
    EmptyInput,
}

/// Errors that can occur when working with a glossary
#[derive(Error, Debug)]
pub enum GlossaryError {
    /// Error reading or writing the glossary record
    #[error("Glossary I/O error: {0}")]
    Io(String),

    /// Error deserializing a glossary record
    #[error("Malformed glossary record: {0}")]
    Malformed(String),
}

/// Errors that can occur during QA validation and repair
#[derive(Error, Debug)]
pub enum QaError {
    /// Error from the backend while re-translating a segment
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The repair loop was given an empty episode
    #[error("Nothing to validate: empty episode content")]
    EmptyEpisode,
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the backend provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from episode splitting
    #[error("Split error: {0}")]
    Split(#[from] SplitError),

    /// Error from glossary handling
    #[error("Glossary error: {0}")]
    Glossary(#[from] GlossaryError),

    /// Error from QA validation
    #[error("QA error: {0}")]
    Qa(#[from] QaError),

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
