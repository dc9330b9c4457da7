//! Error types for query compilation, extraction and page driving
//!
//! One crate-level error enum keeps the translation into sink calls in a
//! single place (the driver); everything below it propagates with `?`.

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all tabql operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid query model or client configuration, raised before any
    /// network activity and never retried
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure executing a page request
    #[error("transport error: {message}")]
    Transport {
        /// HTTP status, when the failure happened after a response line
        status: Option<u16>,
        message: String,
    },

    /// Malformed or truncated response body, fatal for the page in progress
    #[error("parse error at byte {offset}: {message}")]
    Parse { offset: usize, message: String },

    /// A configured match path could not be parsed
    #[error("invalid match path '{path}': {message}")]
    InvalidPath { path: String, message: String },
}

impl Error {
    /// Shorthand for a configuration error
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Shorthand for a transport error without a status line
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Shorthand for a parse error at a byte offset
    #[inline]
    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            message: message.into(),
        }
    }

    /// Whether this error was raised before any request was issued
    #[inline]
    pub fn is_pre_network(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::InvalidPath { .. })
    }
}
