//! Connection registry for connection identity and room subscription tracking.
//!
//! The registry maintains bidirectional mappings: room → connections (for
//! broadcast) and connection → rooms (for cleanup on disconnect). A room is
//! named by the id of the session it belongs to. The reverse index is what
//! lets a disconnect touch only the sessions the connection takes part in,
//! instead of scanning every open session.
//!
//! Connections must be registered before they can subscribe. When you
//! unregister a connection, we automatically remove all its subscriptions.

use std::collections::{HashMap, HashSet};

use airwave_proto::{ConnectionId, SessionId};

/// Identity established by the external auth layer before the connection
/// reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user id
    pub user_id: String,
    /// Display name
    pub name: String,
}

/// Information about a registered connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectionInfo {
    /// Authenticated identity, if the upgrade request carried one
    pub identity: Option<Identity>,
}

impl ConnectionInfo {
    /// Anonymous connection.
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    /// Connection with an authenticated identity.
    pub fn authenticated(identity: Identity) -> Self {
        Self { identity: Some(identity) }
    }

    /// Display name from the identity, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.name.as_str())
    }
}

/// Registry for tracking connections and room subscriptions.
///
/// Maintains bidirectional mappings for efficient lookups:
/// - Get all connections in a room (for broadcast)
/// - Get all rooms a connection is in (for disconnect cleanup)
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Connection ID → connection info
    connections: HashMap<ConnectionId, ConnectionInfo>,
    /// Room → set of subscribed connections
    room_subscriptions: HashMap<SessionId, HashSet<ConnectionId>>,
    /// Connection → set of subscribed rooms
    connection_rooms: HashMap<ConnectionId, HashSet<SessionId>>,
}

impl ConnectionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection.
    ///
    /// Returns `false` if the connection already exists.
    pub fn register(&mut self, connection_id: ConnectionId, info: ConnectionInfo) -> bool {
        if self.connections.contains_key(&connection_id) {
            return false;
        }

        self.connections.insert(connection_id, info);
        self.connection_rooms.insert(connection_id, HashSet::new());
        true
    }

    /// Unregister a connection and remove all its room subscriptions.
    ///
    /// Returns the connection info if it existed, along with the rooms it was
    /// in.
    pub fn unregister(
        &mut self,
        connection_id: ConnectionId,
    ) -> Option<(ConnectionInfo, HashSet<SessionId>)> {
        let info = self.connections.remove(&connection_id)?;
        let rooms = self.connection_rooms.remove(&connection_id).unwrap_or_default();

        for room in &rooms {
            if let Some(subscribers) = self.room_subscriptions.get_mut(room) {
                subscribers.remove(&connection_id);
                if subscribers.is_empty() {
                    self.room_subscriptions.remove(room);
                }
            }
        }

        Some((info, rooms))
    }

    /// Connection metadata. `None` if the connection doesn't exist.
    pub fn info(&self, connection_id: ConnectionId) -> Option<&ConnectionInfo> {
        self.connections.get(&connection_id)
    }

    /// Check if a connection is registered.
    pub fn has_connection(&self, connection_id: ConnectionId) -> bool {
        self.connections.contains_key(&connection_id)
    }

    /// Subscribe a connection to a room.
    ///
    /// Returns `false` if the connection is not registered.
    pub fn subscribe(&mut self, connection_id: ConnectionId, room: SessionId) -> bool {
        if !self.connections.contains_key(&connection_id) {
            return false;
        }

        self.room_subscriptions.entry(room).or_default().insert(connection_id);
        self.connection_rooms.entry(connection_id).or_default().insert(room);
        true
    }

    /// Unsubscribe a connection from a room.
    ///
    /// Returns `true` if the connection was subscribed and is now unsubscribed.
    pub fn unsubscribe(&mut self, connection_id: ConnectionId, room: SessionId) -> bool {
        let removed_from_room =
            self.room_subscriptions.get_mut(&room).is_some_and(|s| s.remove(&connection_id));

        let removed_from_connection =
            self.connection_rooms.get_mut(&connection_id).is_some_and(|r| r.remove(&room));

        if self.room_subscriptions.get(&room).is_some_and(HashSet::is_empty) {
            self.room_subscriptions.remove(&room);
        }

        removed_from_room && removed_from_connection
    }

    /// Drop a room, unsubscribing every member.
    ///
    /// Returns the former members.
    pub fn close_room(&mut self, room: SessionId) -> HashSet<ConnectionId> {
        let members = self.room_subscriptions.remove(&room).unwrap_or_default();
        for connection_id in &members {
            if let Some(rooms) = self.connection_rooms.get_mut(connection_id) {
                rooms.remove(&room);
            }
        }
        members
    }

    /// Check if a connection is subscribed to a room.
    pub fn is_subscribed(&self, connection_id: ConnectionId, room: SessionId) -> bool {
        self.room_subscriptions.get(&room).is_some_and(|s| s.contains(&connection_id))
    }

    /// All connections subscribed to a room.
    pub fn connections_in_room(&self, room: SessionId) -> impl Iterator<Item = ConnectionId> + '_ {
        self.room_subscriptions.get(&room).into_iter().flat_map(|s| s.iter().copied())
    }

    /// All rooms a connection is subscribed to.
    pub fn rooms_for_connection(
        &self,
        connection_id: ConnectionId,
    ) -> impl Iterator<Item = SessionId> + '_ {
        self.connection_rooms.get(&connection_id).into_iter().flat_map(|r| r.iter().copied())
    }

    /// All registered connections.
    pub fn connection_ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.connections.keys().copied()
    }

    /// Total number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of connections subscribed to a room.
    pub fn room_size(&self, room: SessionId) -> usize {
        self.room_subscriptions.get(&room).map_or(0, HashSet::len)
    }
}
