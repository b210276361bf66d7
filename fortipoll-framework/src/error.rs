//! Error types for the collector framework.

use thiserror::Error;

/// Result type alias using [`FrameworkError`].
pub type Result<T> = std::result::Result<T, FrameworkError>;

/// Errors raised by the host side of a collector.
#[derive(Error, Debug)]
pub enum FrameworkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    #[error("Zenoh connection error: {0}")]
    ZenohConnection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to publish to {key}: {message}")]
    Publish { key: String, message: String },

    /// The collector refused to start; the host disables it.
    #[error("Collector '{collector}' failed to start: {message}")]
    Startup { collector: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameworkError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ConfigValidation(msg.into())
    }

    pub fn startup(collector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Startup {
            collector: collector.into(),
            message: message.into(),
        }
    }
}

impl From<fortipoll_common::Error> for FrameworkError {
    fn from(err: fortipoll_common::Error) -> Self {
        match err {
            fortipoll_common::Error::Config(msg) => Self::Config(msg),
            fortipoll_common::Error::Zenoh(e) => Self::ZenohConnection(e.to_string()),
            other => Self::Serialization(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for FrameworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<json5::Error> for FrameworkError {
    fn from(err: json5::Error) -> Self {
        Self::ConfigParse(err.to_string())
    }
}
