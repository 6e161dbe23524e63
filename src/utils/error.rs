//! Error types for the transport and parsing layers
//!
//! This module defines the low-level errors raised while talking to the
//! reservation service and while reading its markup.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Response carried an unexpected content type
    #[error("Unexpected content type: {0}")]
    UnexpectedContentType(String),

    /// Maximum retry attempts exceeded
    #[error("Maximum retry attempts exceeded")]
    MaxRetriesExceeded,

    /// Every listing page failed
    #[error("All {pages} listing pages failed")]
    AllPagesFailed { pages: u32 },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Map a reqwest error, separating timeouts from other transport failures
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Errors raised while extracting a single record from a listing document
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// A required `data-*` attribute was absent
    #[error("Missing attribute: {0}")]
    MissingAttribute(&'static str),

    /// A required child element was absent
    #[error("Missing element: {0}")]
    MissingElement(&'static str),

    /// The booking time was not a 3 or 4 digit time of day
    #[error("Invalid booking time: {0}")]
    InvalidTime(String),
}
