//! Error types for the requester.
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can terminate a run or fail to assemble its input.
#[derive(Debug, Error)]
pub enum Error {
    /// The target URL failed to parse, or lacks a scheme or a host.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The cancellation signal fired while waiting for a permit.
    #[error("operation cancelled")]
    Cancelled,

    /// The request payload could not be serialized.
    #[error("failed to encode request payload")]
    Payload(#[from] serde_json::Error),

    /// A spawned request task panicked.
    #[error("request task failed")]
    Task(#[from] tokio::task::JoinError),

    /// The configuration file could not be opened.
    #[error("failed to open config file '{path}'")]
    ConfigOpen {
        /// Path to the config file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be decoded.
    #[error("failed to decode config from file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The HTTP client could not be built.
    #[cfg(feature = "http")]
    #[error("failed to build http client")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for requester operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
