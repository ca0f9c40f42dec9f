//! Protocol error types.

use serde::{Deserialize, Serialize};

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding or encoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Inbound text is not a valid client frame.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// A required field is present but empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field exceeds its configured limit.
    #[error("field {field} too long: {len} > {max}")]
    TooLong {
        /// Offending field
        field: &'static str,
        /// Observed length in characters
        len: usize,
        /// Allowed maximum
        max: usize,
    },

    /// Outbound frame could not be serialized.
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Error notice sent to the originating connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Stable error code.
    pub code: u16,
    /// Human-readable message.
    pub message: String,
}

impl ErrorPayload {
    /// Frame could not be decoded or failed validation.
    pub const INVALID_PAYLOAD: u16 = 0x0001;
    /// Session does not exist.
    pub const SESSION_NOT_FOUND: u16 = 0x0002;
    /// Only the session host may perform this operation.
    pub const NOT_SESSION_HOST: u16 = 0x0003;
    /// Hosts cannot watch their own session.
    pub const HOST_CANNOT_WATCH: u16 = 0x0004;
    /// Server reached its connection limit.
    pub const SERVER_FULL: u16 = 0x0005;

    /// Create an invalid payload error.
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self { code: Self::INVALID_PAYLOAD, message: msg.into() }
    }

    /// Create a session not found error.
    pub fn session_not_found(session_id: impl std::fmt::Display) -> Self {
        Self { code: Self::SESSION_NOT_FOUND, message: format!("session not found: {session_id}") }
    }

    /// Create a not-host error.
    pub fn not_session_host(session_id: impl std::fmt::Display) -> Self {
        Self {
            code: Self::NOT_SESSION_HOST,
            message: format!("only the host may stop session {session_id}"),
        }
    }

    /// Create a host-cannot-watch error.
    pub fn host_cannot_watch(session_id: impl std::fmt::Display) -> Self {
        Self {
            code: Self::HOST_CANNOT_WATCH,
            message: format!("host cannot join session {session_id} as a viewer"),
        }
    }

    /// Create a server full error.
    pub fn server_full(max_connections: usize) -> Self {
        Self {
            code: Self::SERVER_FULL,
            message: format!("server full ({max_connections} connections)"),
        }
    }
}

impl From<&ProtocolError> for ErrorPayload {
    fn from(err: &ProtocolError) -> Self {
        Self::invalid_payload(err.to_string())
    }
}
