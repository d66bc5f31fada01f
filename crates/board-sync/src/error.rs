//! Error types for the sync layer.

use thiserror::Error;

use board_ops::ErrorKind;

/// Failures reported by a [`HostDocument`](crate::host::HostDocument).
#[derive(Debug, Error)]
pub enum HostError {
    /// The host cannot serve the request right now.
    #[error("host document unavailable: {0}")]
    Unavailable(String),

    /// The host's document could not be parsed or rendered.
    #[error("malformed host document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A request object that cannot be turned into an operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("operation must be a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("unknown action '{0}'")]
    UnknownAction(String),

    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl NormalizeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Failures that abort a whole sync call.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to read host document: {0}")]
    Read(#[source] HostError),

    #[error("failed to write host document: {0}")]
    Write(#[source] HostError),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Sync
    }
}

/// Invalid configuration input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}
