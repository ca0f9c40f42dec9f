//! Operations for model-based testing.
//!
//! Operations represent everything a client can do to the server. They are
//! generated randomly by proptest (or from raw bytes via `arbitrary`) and
//! applied to both the model and the simulated server.

use arbitrary::Arbitrary;

/// Client identifier (0-indexed). Taken modulo the client count.
pub type ClientId = u8;

/// Session reference: index into every session ever started, modulo their
/// number, so ended sessions keep being targeted.
pub type SessionRef = u8;

/// Operations that can be applied to the system.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// Client starts a session as host.
    Start {
        /// Client performing the operation.
        client_id: ClientId,
    },

    /// Client joins a session as viewer.
    Join {
        /// Client joining.
        client_id: ClientId,
        /// Target session.
        session: SessionRef,
    },

    /// Client leaves a session.
    Leave {
        /// Client leaving.
        client_id: ClientId,
        /// Target session.
        session: SessionRef,
    },

    /// Client asks to stop a session.
    Stop {
        /// Client stopping.
        client_id: ClientId,
        /// Target session.
        session: SessionRef,
    },

    /// Client posts a chat message.
    Chat {
        /// Client posting.
        client_id: ClientId,
        /// Target session.
        session: SessionRef,
        /// Whether the client flags it as monetized.
        super_chat: bool,
        /// Amount sent with it.
        amount: u8,
    },

    /// Client asks for the session list.
    List {
        /// Client asking.
        client_id: ClientId,
    },

    /// Client's connection drops.
    Disconnect {
        /// Client disconnecting.
        client_id: ClientId,
    },

    /// Offline client opens a new connection.
    Reconnect {
        /// Client reconnecting.
        client_id: ClientId,
    },
}

impl Operation {
    /// Client this operation is performed by.
    pub fn client_id(&self) -> ClientId {
        match self {
            Self::Start { client_id }
            | Self::Join { client_id, .. }
            | Self::Leave { client_id, .. }
            | Self::Stop { client_id, .. }
            | Self::Chat { client_id, .. }
            | Self::List { client_id }
            | Self::Disconnect { client_id }
            | Self::Reconnect { client_id } => *client_id,
        }
    }
}
