//! Error types for PulseLog
//!
//! This module defines all error types used throughout the PulseLog runtime.
//! Sink write paths deliberately swallow their failures (logging must never
//! crash the host application); these types cover the fallible seams that
//! remain: construction, configuration loading and shutdown.

use thiserror::Error;

/// Main error type for PulseLog operations
#[derive(Error, Debug)]
pub enum PulseLogError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigFileMissing(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Invalid file path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O errors (file operations, network, etc.)
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    /// TOML parsing errors
    #[error("TOML parsing error: {source}")]
    TomlError {
        #[from]
        source: toml::de::Error,
    },

    /// Network-related errors
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Sink-related errors
    #[error("Sink error: {0}")]
    SinkError(String),

    /// Shutdown-related errors
    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for PulseLog operations
pub type Result<T> = std::result::Result<T, PulseLogError>;

impl PulseLogError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    /// Create a new sink error
    pub fn sink<S: Into<String>>(msg: S) -> Self {
        Self::SinkError(msg.into())
    }

    /// Create a new shutdown error
    pub fn shutdown<S: Into<String>>(msg: S) -> Self {
        Self::ShutdownError(msg.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }

    /// Get the error category for logging purposes
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConfigError(_)
            | Self::ConfigFileMissing(_)
            | Self::InvalidLogLevel(_)
            | Self::InvalidPath(_) => "config",
            Self::IoError { .. } => "io",
            Self::SerializationError { .. } => "serialization",
            Self::TomlError { .. } => "toml",
            Self::NetworkError(_) => "network",
            Self::SinkError(_) => "sink",
            Self::ShutdownError(_) => "shutdown",
            Self::InternalError(_) => "internal",
        }
    }
}
