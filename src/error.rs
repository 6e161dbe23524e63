//! Unified error handling for the teeshot crate
//!
//! This module provides a single `Error` enum that wraps transport errors
//! and adds the run-level failures of the claim engine. Listing rows that
//! fail to parse are skipped by the parser and never surface here.
//!
//! # Architecture
//!
//! - [`TeeshotErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use teeshot::error::{Error, ErrorCategory, TeeshotErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     match err.category() {
//!         ErrorCategory::Cancelled => println!("stopped by request"),
//!         _ if err.is_recoverable() => println!("retrying: {err}"),
//!         _ => eprintln!("fatal: {err}"),
//!     }
//! }
//! ```

use thiserror::Error;

pub use crate::utils::error::{FetchError, ParseError};

/// Common trait for all teeshot error types
pub trait TeeshotErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection failures and timeouts
    Transport,
    /// Login rejected by the service
    Auth,
    /// Unexpected response shape, content type, or JSON
    Protocol,
    /// The slot is already taken or booking is closed
    AlreadyClaimed,
    /// The run was stopped on request
    Cancelled,
    /// Configuration and validation errors
    Config,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Transport => "transport",
            Self::Auth => "auth",
            Self::Protocol => "protocol",
            Self::AlreadyClaimed => "already-claimed",
            Self::Cancelled => "cancelled",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

/// Unified error type for the teeshot crate
#[derive(Error, Debug)]
pub enum Error {
    /// Transport errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Login rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Response did not have the expected shape
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Slot already claimed or booking closed
    #[error("Slot unavailable: {0}")]
    AlreadyClaimed(String),

    /// Cancellation was requested
    #[error("Cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl TeeshotErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => !matches!(e, FetchError::InvalidUrl(_)),
            Self::Auth(_) => false,
            Self::Protocol(_) => true,
            Self::AlreadyClaimed(_) => false,
            Self::Cancelled => false,
            Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(FetchError::UnexpectedContentType(_)) => ErrorCategory::Protocol,
            Self::Fetch(_) => ErrorCategory::Transport,
            Self::Protocol(_) => ErrorCategory::Protocol,
            Self::Auth(_) => ErrorCategory::Auth,
            Self::AlreadyClaimed(_) => ErrorCategory::AlreadyClaimed,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// True when this error only reports a cancellation request
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Fetch(FetchError::from_transport(err))
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
