//! Defines the custom `Error` and `Result` types for the runtime.

use crate::wire::{ErrorCode, ToolExecutionError};
use std::fmt;

/// The primary error type for the runtime.
///
/// This enum consolidates all possible failures that can occur within the
/// crate, letting callers programmatically handle different error
/// conditions.
#[derive(Debug)]
pub enum Error {
    /// An error during network I/O (connection refused, reset, closed by peer).
    Io(std::io::Error),

    /// An error during JSON serialization or deserialization.
    Serialization(serde_json::Error),

    /// The server returned a `status: "error"` response for a `call()`.
    ToolExecution(ToolExecutionError),

    /// A WebSocket-layer error (handshake failure, protocol violation).
    WebSocket(String),

    /// An internal channel for asynchronous operations was closed unexpectedly,
    /// usually indicating that a background task has panicked or terminated.
    ChannelClosed,

    /// The future waiting for a response timed out.
    Timeout,

    /// The connection was closed locally or by the peer.
    ConnectionClosed,

    /// Startup configuration was invalid.
    Configuration(String),

    /// A general-purpose error for miscellaneous issues.
    Other(String),
}

/// A specialized `Result` type for the runtime.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Best-effort mapping of an internal failure onto the closed wire error-code
    /// taxonomy, for building an error response to send back to a client.
    pub fn as_error_code(&self) -> ErrorCode {
        match self {
            Error::Serialization(_) => ErrorCode::InvalidJson,
            Error::Configuration(_) => ErrorCode::InternalServerError,
            _ => ErrorCode::InternalServerError,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Serialization(e) => write!(f, "serialization error: {}", e),
            Error::ToolExecution(e) => write!(f, "tool error ({}): {}", e.code, e.message),
            Error::WebSocket(msg) => write!(f, "WebSocket error: {}", msg),
            Error::ChannelClosed => write!(f, "internal communication channel closed"),
            Error::Timeout => write!(f, "operation timed out"),
            Error::ConnectionClosed => write!(f, "connection closed"),
            Error::Configuration(msg) => write!(f, "configuration error: {}", msg),
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err)
    }
}

impl From<ToolExecutionError> for Error {
    fn from(err: ToolExecutionError) -> Self {
        Error::ToolExecution(err)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::WebSocket(err.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::ChannelClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::ChannelClosed
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Timeout
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
