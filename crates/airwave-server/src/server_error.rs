//! Driver error types.
//!
//! Provides strongly-typed errors for driver operations:
//! - Connection management (registration, lookup)
//! - Session store access
//! - Action execution (encode, deliver)
//!
//! None of these reach clients directly. Conditions a client caused are
//! answered with an `ErrorPayload` notice instead.

use std::fmt;

use airwave_core::StoreError;
use airwave_proto::{ConnectionId, ProtocolError};

/// Errors that can occur while the driver processes an event.
#[derive(Debug)]
pub enum ServerError {
    /// Connection not found in registry.
    ///
    /// An event arrived for a connection that was never accepted or has
    /// already closed. The runtime logs and skips the event.
    ConnectionNotFound(ConnectionId),

    /// Connection already registered.
    ///
    /// The runtime assigned the same id twice. This is a logic bug in the
    /// runtime; connection ids are unique for the process lifetime.
    ConnectionAlreadyExists(ConnectionId),

    /// Session store rejected an operation the driver expected to succeed.
    ///
    /// The session was resolved earlier in the same event, so the store and
    /// the driver disagree. This is a logic bug.
    Store(StoreError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionNotFound(id) => write!(f, "connection not found: {id}"),
            Self::ConnectionAlreadyExists(id) => write!(f, "connection already exists: {id}"),
            Self::Store(err) => write!(f, "store error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Errors from action execution.
#[derive(Debug)]
pub enum ExecutorError {
    /// Delivery to a connection failed.
    ///
    /// The connection's writer is gone (closed or broken). Transient from the
    /// server's point of view: the close event for it is on its way.
    SendFailed {
        /// Connection that failed
        connection_id: ConnectionId,
        /// Error message
        reason: String,
    },

    /// A server message could not be encoded.
    Encode(String),
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed { connection_id, reason } => {
                write!(f, "send failed for {connection_id}: {reason}")
            },
            Self::Encode(msg) => write!(f, "encode failed: {msg}"),
        }
    }
}

impl std::error::Error for ExecutorError {}

impl From<ProtocolError> for ExecutorError {
    fn from(err: ProtocolError) -> Self {
        Self::Encode(err.to_string())
    }
}
