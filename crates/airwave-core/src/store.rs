//! Session Store
//!
//! Owns every active [`Session`] keyed by [`SessionId`]. All mutation goes
//! through the operations below, each of which leaves the store consistent
//! before returning, so a caller holding `&mut SessionStore` can never observe
//! a half-updated session.
//!
//! Lookups for unknown ids return `None` or [`StoreError::SessionNotFound`];
//! nothing here panics on a stale id.

use std::collections::HashMap;

use airwave_proto::{ChatMessage, ConnectionId, SessionId, SessionSummary};

use crate::{env::Environment, error::StoreError, session::Session};

/// In-memory registry of live sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
    /// Monotonic creation counter
    next_seq: u64,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id and insert an empty session.
    ///
    /// Ids are random v4 UUIDs drawn from `env`. A draw that collides with a
    /// live session is discarded and redrawn.
    pub fn create<E: Environment>(
        &mut self,
        env: &E,
        title: impl Into<String>,
        host_name: impl Into<String>,
        host: ConnectionId,
    ) -> SessionId {
        let mut id = SessionId::from_random_bytes(env.random_id_bytes());
        while self.sessions.contains_key(&id) {
            id = SessionId::from_random_bytes(env.random_id_bytes());
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        self.sessions.insert(id, Session::new(id, title.into(), host_name.into(), host, seq));
        id
    }

    /// Session by id. `None` if it does not exist.
    pub fn get(&self, session_id: SessionId) -> Option<&Session> {
        self.sessions.get(&session_id)
    }

    /// Check if a session exists.
    pub fn contains(&self, session_id: SessionId) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Add a viewer and return the new viewer count.
    ///
    /// Idempotent: re-adding an existing viewer leaves the count unchanged.
    /// The host of the session is refused so the viewer set never contains it.
    pub fn add_viewer(
        &mut self,
        session_id: SessionId,
        connection_id: ConnectionId,
    ) -> Result<usize, StoreError> {
        let session =
            self.sessions.get_mut(&session_id).ok_or(StoreError::SessionNotFound(session_id))?;

        if session.is_host(connection_id) {
            return Err(StoreError::HostCannotWatch { session_id, connection_id });
        }

        session.insert_viewer(connection_id);
        Ok(session.viewer_count())
    }

    /// Remove a viewer.
    ///
    /// Returns `Ok(Some(count))` with the new count if the connection was a
    /// viewer, `Ok(None)` if it was not (nothing changed).
    pub fn remove_viewer(
        &mut self,
        session_id: SessionId,
        connection_id: ConnectionId,
    ) -> Result<Option<usize>, StoreError> {
        let session =
            self.sessions.get_mut(&session_id).ok_or(StoreError::SessionNotFound(session_id))?;

        if session.remove_viewer(connection_id) {
            Ok(Some(session.viewer_count()))
        } else {
            Ok(None)
        }
    }

    /// Delete a session. Later lookups return `None`.
    pub fn remove_session(&mut self, session_id: SessionId) -> Option<Session> {
        self.sessions.remove(&session_id)
    }

    /// Append a message to a session's chat log.
    pub fn append_chat(
        &mut self,
        session_id: SessionId,
        message: ChatMessage,
    ) -> Result<(), StoreError> {
        let session =
            self.sessions.get_mut(&session_id).ok_or(StoreError::SessionNotFound(session_id))?;
        session.push_chat(message);
        Ok(())
    }

    /// Directory of active sessions, oldest first.
    pub fn summaries(&self) -> Vec<SessionSummary> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_unstable_by_key(|s| s.seq());
        sessions.into_iter().map(Session::summary).collect()
    }

    /// All sessions, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// No active sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
