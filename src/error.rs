// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for the inkwall monitor
//!
//! Classification is fail-open: callers on the observation path are expected
//! to log these and drop the observation rather than fail the page.

use thiserror::Error;

/// Result type alias for inkwall operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the inkwall monitor
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed (remote-size lookups only)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// HTML parsing or serialization failed
    #[error("HTML error: {0}")]
    Html(String),

    /// Registry store operation failed
    #[error("Store error: {0}")]
    Store(String),

    /// Client report could not be processed
    #[error("Report error: {0}")]
    Report(String),

    /// Mail delivery failed
    #[error("Mail error: {0}")]
    Mail(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new store error
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Error::Store(msg.into())
    }

    /// Create a new report error
    pub fn report<S: Into<String>>(msg: S) -> Self {
        Error::Report(msg.into())
    }

    /// Create a new mail error
    pub fn mail<S: Into<String>>(msg: S) -> Self {
        Error::Mail(msg.into())
    }

    /// Create a new HTML error
    pub fn html<S: Into<String>>(msg: S) -> Self {
        Error::Html(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a network error
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(_))
    }

    /// Check if this error may leave the registry out of date
    ///
    /// Used by the observation path to decide whether to log a dropped
    /// observation. Enforcement never consults this - a declined snapshot
    /// read that fails simply blocks nothing for that request.
    pub fn drops_observation(&self) -> bool {
        matches!(self, Error::Store(_) | Error::Http(_))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error() {
        let err = Error::store("row locked");
        assert!(err.drops_observation());
        assert!(!err.is_network());
        assert_eq!(err.to_string(), "Store error: row locked");
    }

    #[test]
    fn test_url_error_conversion() {
        let err: Error = url::ParseError::EmptyHost.into();
        assert!(matches!(err, Error::Url(_)));
        assert!(!err.drops_observation());
    }
}
