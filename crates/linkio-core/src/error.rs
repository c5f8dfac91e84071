// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Linkio session console.

use thiserror::Error;

/// The primary error type used across all Linkio adapter traits and core operations.
#[derive(Debug, Error)]
pub enum LinkioError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Credential store errors (load, save, or purge failure).
    #[error("credential store error: {message}")]
    Credential {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Protocol socket errors (open failure, send failure, termination failure).
    #[error("socket error: {message}")]
    Socket {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Code rendering errors (scan payload could not be turned into an image).
    #[error("code render error: {message}")]
    Render {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Subscriber channel errors (push delivery failure, closed peer).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LinkioError {
    /// Shorthand for a sourceless socket error.
    pub fn socket(message: impl Into<String>) -> Self {
        Self::Socket {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a sourceless credential error.
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message() {
        let err = LinkioError::socket("factory refused");
        assert_eq!(err.to_string(), "socket error: factory refused");

        let err = LinkioError::Config("bad port".into());
        assert_eq!(err.to_string(), "configuration error: bad port");
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error as _;
        let err = LinkioError::Credential {
            message: "write failed".into(),
            source: Some(Box::new(std::io::Error::other("disk full"))),
        };
        assert!(err.source().is_some());
    }
}
