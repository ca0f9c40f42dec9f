//! Observable system state for invariant checks.

use std::collections::BTreeSet;

use airwave_proto::{ConnectionId, SessionId};

use crate::sim_server::SimServer;

/// One live session as the server sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Session id
    pub id: SessionId,
    /// Host connection
    pub host: ConnectionId,
    /// Viewer set from the store
    pub viewers: BTreeSet<ConnectionId>,
    /// Room membership from the registry
    pub room: BTreeSet<ConnectionId>,
    /// Chat log length
    pub chat_len: usize,
    /// Last viewer count announced to the room
    pub reported_count: Option<usize>,
}

/// Whole-server snapshot.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Live sessions, oldest first
    pub sessions: Vec<SessionSnapshot>,
    /// Registered connections
    pub connections: BTreeSet<ConnectionId>,
    /// Every room some connection is subscribed to
    pub subscribed_rooms: BTreeSet<SessionId>,
}

impl SystemSnapshot {
    /// Snapshot with no connections and no sessions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Capture the state of a simulated server.
    pub fn from_server(server: &SimServer) -> Self {
        let driver = server.driver();
        let registry = driver.registry();
        let store = driver.store();

        let connections: BTreeSet<_> = registry.connection_ids().collect();
        let subscribed_rooms =
            connections.iter().flat_map(|&c| registry.rooms_for_connection(c)).collect();

        let sessions = store
            .summaries()
            .into_iter()
            .filter_map(|summary| store.get(summary.id))
            .map(|session| SessionSnapshot {
                id: session.id(),
                host: session.host(),
                viewers: session.viewers().collect(),
                room: registry.connections_in_room(session.id()).collect(),
                chat_len: session.chat_log().len(),
                reported_count: server.reported_count(session.id()),
            })
            .collect();

        Self { sessions, connections, subscribed_rooms }
    }

    /// Session by id.
    pub fn session(&self, id: SessionId) -> Option<&SessionSnapshot> {
        self.sessions.iter().find(|s| s.id == id)
    }
}
