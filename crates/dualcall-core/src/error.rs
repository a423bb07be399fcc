//! Error types for dualcall
//!
//! Every failure reaches the caller through the same channel a successful
//! result would have used: a failed future, an `Err` item on an update
//! stream, a failed `subscribe`, or a failed subscription termination.

use crate::mode::ApiMode;
use thiserror::Error;

/// Result type alias for dualcall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dualcall
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied argument was rejected (e.g. a zero page size)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Subscription was requested against an operation that cannot watch,
    /// and no `override_no_sub` producer was configured
    #[error("{method} is not supported in {mode} mode")]
    Unsupported {
        /// Label of the decorated method
        method: String,
        /// Mode that was requested
        mode: ApiMode,
    },

    /// Failure raised by the underlying producer, forwarded unchanged
    #[error(transparent)]
    Producer(#[from] anyhow::Error),

    /// An update stream ended before it yielded the value a one-shot
    /// resolution was waiting for
    #[error("Update stream closed before a value was produced: {0}")]
    Closed(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an "unsupported in mode" error
    pub fn unsupported(method: impl Into<String>, mode: ApiMode) -> Self {
        Self::Unsupported {
            method: method.into(),
            mode,
        }
    }

    /// Wrap a producer failure
    pub fn producer(err: impl Into<anyhow::Error>) -> Self {
        Self::Producer(err.into())
    }

    /// Create a "stream closed" error
    pub fn closed(method: impl Into<String>) -> Self {
        Self::Closed(method.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error came from the underlying producer
    pub fn is_producer(&self) -> bool {
        matches!(self, Self::Producer(_))
    }
}
