//! Error types for the reminder service.
//!
//! A failed calendar query is an ordinary value the polling loop branches on,
//! never a panic, so the loop can turn it into a red flash and carry on.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Why a calendar query did not produce an event list
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request did not complete within the socket timeout
    #[error("Calendar query timed out after {0:?}")]
    Timeout(Duration),

    /// The calendar API answered with an error or the transport failed
    #[error("Calendar API error: {0}")]
    Api(String),

    /// Token refresh or authorization failed mid-session
    #[error("Authorization error: {0}")]
    Auth(String),

    /// The response could not be interpreted
    #[error("Malformed calendar response: {0}")]
    Malformed(String),
}

impl QueryError {
    pub fn api(message: impl Into<String>) -> Self {
        QueryError::Api(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        QueryError::Malformed(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value parsed but makes no sense
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid(message.into())
    }
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Failed to open LED device: {0}")]
    Open(String),

    #[error("Failed to write LED frame: {0}")]
    Write(String),
}
