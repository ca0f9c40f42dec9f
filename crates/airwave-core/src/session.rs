//! A single live session.

use std::collections::HashSet;

use airwave_proto::{ChatMessage, ConnectionId, SessionId, SessionSummary};

/// State of one live session.
///
/// Sessions are created and destroyed only by the
/// [`SessionStore`](crate::SessionStore); everything else sees them through
/// shared references. A session that has been removed from the store is
/// ended for good, its id is never handed out again.
///
/// # Invariants
///
/// - `viewers` never contains `host`
/// - `chat_log` only ever grows, in insertion order
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    title: String,
    host_name: String,
    host: ConnectionId,
    viewers: HashSet<ConnectionId>,
    chat_log: Vec<ChatMessage>,
    /// Creation order within the store, for stable listings
    seq: u64,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        title: String,
        host_name: String,
        host: ConnectionId,
        seq: u64,
    ) -> Self {
        Self { id, title, host_name, host, viewers: HashSet::new(), chat_log: Vec::new(), seq }
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Display title, fixed for the session's lifetime.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Host display name.
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Connection authorized to publish into this session.
    pub fn host(&self) -> ConnectionId {
        self.host
    }

    /// Whether `connection_id` is the host.
    pub fn is_host(&self, connection_id: ConnectionId) -> bool {
        self.host == connection_id
    }

    /// Whether `connection_id` is currently watching.
    pub fn has_viewer(&self, connection_id: ConnectionId) -> bool {
        self.viewers.contains(&connection_id)
    }

    /// True cardinality of the viewer set.
    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    /// Current viewers, in no particular order.
    pub fn viewers(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.viewers.iter().copied()
    }

    /// Chat log, oldest first.
    pub fn chat_log(&self) -> &[ChatMessage] {
        &self.chat_log
    }

    /// Directory entry for this session.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            title: self.title.clone(),
            host_name: self.host_name.clone(),
            viewers: self.viewers.len(),
        }
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns `true` if the viewer was not already present.
    pub(crate) fn insert_viewer(&mut self, connection_id: ConnectionId) -> bool {
        debug_assert!(connection_id != self.host, "host must never be a viewer");
        self.viewers.insert(connection_id)
    }

    pub(crate) fn remove_viewer(&mut self, connection_id: ConnectionId) -> bool {
        self.viewers.remove(&connection_id)
    }

    pub(crate) fn push_chat(&mut self, message: ChatMessage) {
        self.chat_log.push(message);
    }
}
