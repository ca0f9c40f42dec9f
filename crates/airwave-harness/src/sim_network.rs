//! In-memory delivery network.
//!
//! Stands in for the WebSocket runtime's per-connection channels. Every
//! delivered frame is decoded back into a [`ServerMessage`] and appended to
//! the recipient's inbox, so tests see exactly what a client would receive,
//! in order, after a full encode/decode trip.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};

use airwave_proto::{ConnectionId, ServerMessage};
use airwave_server::{ExecutorError, Outbound};

/// Recording [`Outbound`] implementation.
#[derive(Debug, Default)]
pub struct SimNetwork {
    open: RefCell<HashSet<ConnectionId>>,
    closed: RefCell<HashSet<ConnectionId>>,
    inboxes: RefCell<HashMap<ConnectionId, Vec<ServerMessage>>>,
}

impl SimNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a connection so deliveries to it succeed.
    pub fn open(&self, connection_id: ConnectionId) {
        self.open.borrow_mut().insert(connection_id);
        self.closed.borrow_mut().remove(&connection_id);
    }

    /// Drop a connection from the client side. Later deliveries fail.
    pub fn hang_up(&self, connection_id: ConnectionId) {
        self.open.borrow_mut().remove(&connection_id);
    }

    /// Whether the connection is open.
    pub fn is_open(&self, connection_id: ConnectionId) -> bool {
        self.open.borrow().contains(&connection_id)
    }

    /// Whether the server closed the connection.
    pub fn is_closed(&self, connection_id: ConnectionId) -> bool {
        self.closed.borrow().contains(&connection_id)
    }

    /// Everything delivered to a connection so far.
    pub fn inbox(&self, connection_id: ConnectionId) -> Vec<ServerMessage> {
        self.inboxes.borrow().get(&connection_id).cloned().unwrap_or_default()
    }

    /// Drain a connection's inbox.
    pub fn take(&self, connection_id: ConnectionId) -> Vec<ServerMessage> {
        self.inboxes.borrow_mut().remove(&connection_id).unwrap_or_default()
    }
}

impl Outbound for SimNetwork {
    fn deliver(&self, connection_id: ConnectionId, frame: &str) -> Result<(), ExecutorError> {
        if !self.is_open(connection_id) {
            return Err(ExecutorError::SendFailed {
                connection_id,
                reason: "connection not open".to_string(),
            });
        }

        let message = ServerMessage::decode(frame).map_err(ExecutorError::from)?;
        self.inboxes.borrow_mut().entry(connection_id).or_default().push(message);
        Ok(())
    }

    fn close(&self, connection_id: ConnectionId, reason: &str) {
        tracing::debug!("sim close {}: {}", connection_id, reason);
        self.open.borrow_mut().remove(&connection_id);
        self.closed.borrow_mut().insert(connection_id);
    }
}
