//! Server driver.
//!
//! Ties together the [`SessionStore`] (session state and chat logs) and the
//! [`ConnectionRegistry`] (who is connected and which rooms they sit in). The
//! driver is Sans-IO: it consumes [`ServerEvent`]s and returns the
//! [`ServerAction`]s the runtime must perform, in order.
//!
//! The per-message handlers live next to their concern: session lifecycle in
//! `lifecycle`, negotiation relay in `relay`, chat in `chat`.

use airwave_core::{Environment, SessionStore};
use airwave_proto::{
    ClientMessage, ConnectionId, ErrorPayload, ProtocolError, ServerMessage, SessionId,
};

use crate::{
    registry::{ConnectionInfo, ConnectionRegistry, Identity},
    server_error::ServerError,
};

/// Driver configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum concurrent connections
    pub max_connections: usize,
    /// Maximum session title length, in characters
    pub max_title_len: usize,
    /// Maximum chat message length, in characters
    pub max_chat_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { max_connections: 10_000, max_title_len: 200, max_chat_len: 2_000 }
    }
}

/// Events that the server driver processes.
///
/// These are produced by the external runtime (simulation or production).
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// A new connection was accepted
    ConnectionAccepted {
        /// Unique connection ID assigned by the runtime
        connection_id: ConnectionId,
        /// Identity established by the auth layer, if any
        identity: Option<Identity>,
    },

    /// A well-formed message was received from a connection
    MessageReceived {
        /// Connection that sent the message
        connection_id: ConnectionId,
        /// The decoded message
        message: ClientMessage,
    },

    /// A frame from a connection failed to decode
    MessageRejected {
        /// Connection that sent the frame
        connection_id: ConnectionId,
        /// Decode error
        reason: String,
    },

    /// A connection was closed (by peer or error)
    ConnectionClosed {
        /// Connection that was closed
        connection_id: ConnectionId,
        /// Reason for closure
        reason: String,
    },
}

/// Actions that the server driver produces.
///
/// These are executed by runtime-specific code (production or simulation).
/// Broadcast recipients are resolved when the action is produced, so each
/// action reflects room membership at that exact point of the batch.
#[derive(Debug, Clone)]
pub enum ServerAction<I = std::time::Instant> {
    /// Send a message to a single connection
    SendToConnection {
        /// Target connection
        connection_id: ConnectionId,
        /// Message to send
        message: ServerMessage,
    },

    /// Send a message to every member of a session room
    BroadcastToRoom {
        /// Room the broadcast is for
        session_id: SessionId,
        /// Room members at the time of the broadcast, sorted
        recipients: Vec<ConnectionId>,
        /// Message to send
        message: ServerMessage,
    },

    /// Send a message to every connection
    BroadcastToAll {
        /// Every registered connection, sorted
        recipients: Vec<ConnectionId>,
        /// Message to send
        message: ServerMessage,
    },

    /// Close a connection
    CloseConnection {
        /// Connection to close
        connection_id: ConnectionId,
        /// Reason for closure
        reason: String,
    },

    /// Log a message (for debugging/monitoring)
    Log {
        /// Log level
        level: LogLevel,
        /// Message to log
        message: String,
        /// When the event occurred
        timestamp: I,
    },
}

impl<I> ServerAction<I> {
    /// Connections this action delivers a message to.
    pub fn recipients(&self) -> &[ConnectionId] {
        match self {
            Self::SendToConnection { connection_id, .. } => std::slice::from_ref(connection_id),
            Self::BroadcastToRoom { recipients, .. } | Self::BroadcastToAll { recipients, .. } => {
                recipients
            },
            Self::CloseConnection { .. } | Self::Log { .. } => &[],
        }
    }

    /// Message carried by this action, if any.
    pub fn message(&self) -> Option<&ServerMessage> {
        match self {
            Self::SendToConnection { message, .. }
            | Self::BroadcastToRoom { message, .. }
            | Self::BroadcastToAll { message, .. } => Some(message),
            Self::CloseConnection { .. } | Self::Log { .. } => None,
        }
    }
}

/// Log levels for server actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

/// Actions produced for one event.
pub(crate) type Actions<E> = Vec<ServerAction<<E as Environment>::Instant>>;

/// Action-based server driver.
///
/// Orchestrates connection management, session lifecycle, negotiation relay
/// and chat.
pub struct ServerDriver<E: Environment> {
    /// Connection and room registry
    pub(crate) registry: ConnectionRegistry,
    /// Live sessions
    pub(crate) store: SessionStore,
    /// Environment (time, RNG)
    pub(crate) env: E,
    /// Driver configuration
    pub(crate) config: ServerConfig,
}

impl<E: Environment> ServerDriver<E> {
    /// Create a new server driver.
    pub fn new(env: E, config: ServerConfig) -> Self {
        Self { registry: ConnectionRegistry::new(), store: SessionStore::new(), env, config }
    }

    /// Process a server event and return actions to execute.
    ///
    /// This is the main entry point for the server driver.
    pub fn process_event(&mut self, event: ServerEvent) -> Result<Actions<E>, ServerError> {
        match event {
            ServerEvent::ConnectionAccepted { connection_id, identity } => {
                self.handle_connection_accepted(connection_id, identity)
            },
            ServerEvent::MessageReceived { connection_id, message } => {
                self.handle_message_received(connection_id, message)
            },
            ServerEvent::MessageRejected { connection_id, reason } => {
                self.handle_message_rejected(connection_id, &reason)
            },
            ServerEvent::ConnectionClosed { connection_id, reason } => {
                Ok(self.disconnect(connection_id, &reason))
            },
        }
    }

    /// Handle a new connection being accepted.
    fn handle_connection_accepted(
        &mut self,
        connection_id: ConnectionId,
        identity: Option<Identity>,
    ) -> Result<Actions<E>, ServerError> {
        if self.registry.connection_count() >= self.config.max_connections {
            return Ok(vec![
                self.send(
                    connection_id,
                    ServerMessage::Error(ErrorPayload::server_full(self.config.max_connections)),
                ),
                ServerAction::CloseConnection {
                    connection_id,
                    reason: "max connections exceeded".to_string(),
                },
            ]);
        }

        let info = match identity {
            Some(identity) => ConnectionInfo::authenticated(identity),
            None => ConnectionInfo::anonymous(),
        };
        let who = info.identity.as_ref().map_or("anonymous", |i| i.user_id.as_str()).to_string();

        if !self.registry.register(connection_id, info) {
            return Err(ServerError::ConnectionAlreadyExists(connection_id));
        }

        Ok(vec![
            self.send(connection_id, ServerMessage::Connected { connection_id }),
            self.log(LogLevel::Debug, format!("{connection_id} accepted ({who})")),
        ])
    }

    /// Handle a decoded message from a connection.
    fn handle_message_received(
        &mut self,
        connection_id: ConnectionId,
        message: ClientMessage,
    ) -> Result<Actions<E>, ServerError> {
        if !self.registry.has_connection(connection_id) {
            return Err(ServerError::ConnectionNotFound(connection_id));
        }

        let actions = match message {
            ClientMessage::StartSession { title, host_name } => {
                self.start_session(connection_id, title, host_name)
            },
            ClientMessage::JoinSession { session_id } => {
                self.join_session(connection_id, &session_id)
            },
            ClientMessage::LeaveSession { session_id } => {
                self.leave_session(connection_id, &session_id)
            },
            ClientMessage::StopSession { session_id } => {
                self.stop_session(connection_id, &session_id)
            },
            ClientMessage::ListSessions => self.list_sessions(connection_id),
            ClientMessage::Offer { session_id, target, payload } => {
                self.relay_offer(connection_id, session_id, target, payload)
            },
            ClientMessage::Answer { session_id, payload } => {
                self.relay_answer(connection_id, &session_id, payload)
            },
            ClientMessage::Candidate { session_id, target, payload } => {
                self.relay_candidate(connection_id, session_id, target, payload)
            },
            ClientMessage::ChatMessage {
                session_id,
                author,
                text,
                is_super_chat,
                amount,
                timestamp,
            } => {
                let draft =
                    airwave_core::ChatDraft { author, text, is_super_chat, amount, timestamp };
                self.post_message(connection_id, &session_id, draft)?
            },
        };

        Ok(actions)
    }

    /// Handle a frame that failed to decode.
    fn handle_message_rejected(
        &mut self,
        connection_id: ConnectionId,
        reason: &str,
    ) -> Result<Actions<E>, ServerError> {
        if !self.registry.has_connection(connection_id) {
            return Err(ServerError::ConnectionNotFound(connection_id));
        }

        Ok(self.reject(connection_id, reason))
    }

    /// Decline a malformed request: `INVALID_PAYLOAD` to the sender only.
    pub(crate) fn reject(&self, connection_id: ConnectionId, reason: &str) -> Actions<E> {
        vec![
            self.send(connection_id, ServerMessage::Error(ErrorPayload::invalid_payload(reason))),
            self.log(LogLevel::Warn, format!("rejected frame from {connection_id}: {reason}")),
        ]
    }

    /// Decline a request that decoded but broke a limit.
    pub(crate) fn reject_invalid(
        &self,
        connection_id: ConnectionId,
        err: &ProtocolError,
    ) -> Actions<E> {
        vec![
            self.send(connection_id, ServerMessage::Error(ErrorPayload::from(err))),
            self.log(LogLevel::Warn, format!("declined request from {connection_id}: {err}")),
        ]
    }

    /// Resolve a session id as sent by a client.
    ///
    /// `None` if it does not parse or names no live session.
    pub(crate) fn resolve(&self, raw: &str) -> Option<SessionId> {
        raw.parse::<SessionId>().ok().filter(|id| self.store.contains(*id))
    }

    pub(crate) fn send(
        &self,
        connection_id: ConnectionId,
        message: ServerMessage,
    ) -> ServerAction<E::Instant> {
        ServerAction::SendToConnection { connection_id, message }
    }

    pub(crate) fn broadcast_room(
        &self,
        session_id: SessionId,
        message: ServerMessage,
    ) -> ServerAction<E::Instant> {
        let mut recipients: Vec<_> = self.registry.connections_in_room(session_id).collect();
        recipients.sort_unstable();
        ServerAction::BroadcastToRoom { session_id, recipients, message }
    }

    pub(crate) fn broadcast_all(&self, message: ServerMessage) -> ServerAction<E::Instant> {
        let mut recipients: Vec<_> = self.registry.connection_ids().collect();
        recipients.sort_unstable();
        ServerAction::BroadcastToAll { recipients, message }
    }

    pub(crate) fn log(&self, level: LogLevel, message: String) -> ServerAction<E::Instant> {
        ServerAction::Log { level, message, timestamp: self.env.now() }
    }

    /// Live session state.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Connection and room registry.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    /// Driver configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl<E: Environment> std::fmt::Debug for ServerDriver<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerDriver")
            .field("connection_count", &self.registry.connection_count())
            .field("session_count", &self.store.len())
            .finish()
    }
}

/// Check a client-supplied field against its limit, counted in characters.
pub(crate) fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ProtocolError> {
    let len = value.chars().count();
    if len > max {
        return Err(ProtocolError::TooLong { field, len, max });
    }
    Ok(())
}
