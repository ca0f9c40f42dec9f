//! Session store errors.

use airwave_proto::{ConnectionId, SessionId};

/// Errors from [`SessionStore`](crate::SessionStore) operations.
///
/// None of these are faults. Each maps to a notice for the originating
/// connection or a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Session does not exist (never did, or already ended).
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The connection hosts this session and cannot also watch it.
    #[error("connection {connection_id} hosts session {session_id}")]
    HostCannotWatch {
        /// Session being joined
        session_id: SessionId,
        /// Host connection
        connection_id: ConnectionId,
    },
}
