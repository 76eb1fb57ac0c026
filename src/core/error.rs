//! Error types and result handling for faultline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for faultline operations.
///
/// These are faults of the pipeline machinery itself (configuration I/O,
/// sink writes, installation state). Captured signals are not errors in
/// this sense; they flow through [`crate::core::types::ErrorRecord`].
#[derive(Error, Debug)]
pub enum Error {
    // ===== Configuration Errors =====
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error("Failed to save configuration: {0}")]
    ConfigSave(String),

    #[error("Invalid configuration value: {field} - {message}")]
    ConfigInvalid { field: String, message: String },

    // ===== Installation Errors =====
    #[error("A fault handler is already installed in this process")]
    AlreadyInstalled,

    // ===== Sink Errors =====
    #[error("Failed to open log sink: {path}")]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write log entry to sink")]
    SinkWrite(#[source] std::io::Error),

    #[error("Failed to flush log sink")]
    SinkFlush(#[source] std::io::Error),

    // ===== Serialization Errors =====
    #[error("JSON serialization error")]
    JsonSerialize(#[from] serde_json::Error),

    // ===== Generic Errors =====
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl Error {
    /// Create a sink open error.
    pub fn sink_open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SinkOpen {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid-configuration error.
    pub fn config_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the error came from the logging sink rather than the
    /// handler itself. Sink failures are reported through the fallback
    /// log and never abort an event.
    pub fn is_sink_error(&self) -> bool {
        matches!(
            self,
            Error::SinkOpen { .. } | Error::SinkWrite(_) | Error::SinkFlush(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config_invalid("default_level", "unknown level");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value: default_level - unknown level"
        );
    }

    #[test]
    fn test_sink_error_classification() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert!(Error::SinkWrite(io).is_sink_error());
        assert!(!Error::AlreadyInstalled.is_sink_error());
    }
}
