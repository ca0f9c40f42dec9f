//! Simulated server.
//!
//! Drives a real [`ServerDriver`] the way the WebSocket runtime does: assign
//! sequential connection ids, turn client frames into events, execute the
//! resulting actions against a [`SimNetwork`]. No sockets, no tasks, no
//! wall-clock time.

use std::{collections::HashMap, time::Duration};

use airwave_proto::{ClientMessage, ConnectionId, ServerMessage, SessionId};
use airwave_server::{
    DriverConfig, DriverError, Identity, ServerAction, ServerDriver, ServerEvent, execute_actions,
};

use crate::{invariants::SystemSnapshot, sim_env::SimEnv, sim_network::SimNetwork};

/// Actions the driver produced for one event, in execution order.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    actions: Vec<ServerAction<Duration>>,
}

impl Outcome {
    /// Raw actions.
    pub fn actions(&self) -> &[ServerAction<Duration>] {
        &self.actions
    }

    /// Messages addressed to `connection_id`, in order.
    pub fn to(&self, connection_id: ConnectionId) -> Vec<&ServerMessage> {
        self.actions
            .iter()
            .filter(|a| a.recipients().contains(&connection_id))
            .filter_map(ServerAction::message)
            .collect()
    }

    /// Every message produced, whoever it was for.
    pub fn messages(&self) -> impl Iterator<Item = &ServerMessage> {
        self.actions.iter().filter_map(ServerAction::message)
    }

    /// Whether nothing but log lines came out.
    pub fn is_silent(&self) -> bool {
        self.messages().next().is_none()
    }
}

/// Driver plus simulated network and environment.
pub struct SimServer {
    driver: ServerDriver<SimEnv>,
    network: SimNetwork,
    env: SimEnv,
    next_connection: u64,
    /// Last viewer count announced per live session
    reported_counts: HashMap<SessionId, usize>,
}

impl SimServer {
    /// Server with default limits.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, DriverConfig::default())
    }

    /// Server with custom limits.
    pub fn with_config(seed: u64, config: DriverConfig) -> Self {
        let env = SimEnv::with_seed(seed);
        Self {
            driver: ServerDriver::new(env.clone(), config),
            network: SimNetwork::new(),
            env,
            next_connection: 1,
            reported_counts: HashMap::new(),
        }
    }

    /// Open an anonymous connection.
    pub fn connect(&mut self) -> ConnectionId {
        self.connect_with(None)
    }

    /// Open a connection carrying an authenticated identity.
    pub fn connect_as(&mut self, user_id: &str, name: &str) -> ConnectionId {
        self.connect_with(Some(Identity { user_id: user_id.to_string(), name: name.to_string() }))
    }

    fn connect_with(&mut self, identity: Option<Identity>) -> ConnectionId {
        let connection_id = ConnectionId(self.next_connection);
        self.next_connection += 1;

        self.network.open(connection_id);
        if let Err(e) =
            self.process(ServerEvent::ConnectionAccepted { connection_id, identity })
        {
            tracing::warn!("sim accept of {} failed: {}", connection_id, e);
        }
        connection_id
    }

    /// Deliver a decoded client message.
    pub fn send(
        &mut self,
        connection_id: ConnectionId,
        message: ClientMessage,
    ) -> Result<Outcome, DriverError> {
        self.process(ServerEvent::MessageReceived { connection_id, message })
    }

    /// Deliver a raw text frame, decoding it like the runtime does.
    pub fn send_text(
        &mut self,
        connection_id: ConnectionId,
        text: &str,
    ) -> Result<Outcome, DriverError> {
        let event = match ClientMessage::decode(text) {
            Ok(message) => ServerEvent::MessageReceived { connection_id, message },
            Err(e) => ServerEvent::MessageRejected { connection_id, reason: e.to_string() },
        };
        self.process(event)
    }

    /// Client goes away abruptly.
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Result<Outcome, DriverError> {
        self.network.hang_up(connection_id);
        self.process(ServerEvent::ConnectionClosed {
            connection_id,
            reason: "peer went away".to_string(),
        })
    }

    /// Run one event through the driver and execute its actions.
    pub fn process(&mut self, event: ServerEvent) -> Result<Outcome, DriverError> {
        let actions = self.driver.process_event(event)?;

        for action in &actions {
            match action.message() {
                Some(ServerMessage::ViewerCount { session_id, count }) => {
                    self.reported_counts.insert(*session_id, *count);
                },
                Some(ServerMessage::NewSession { id, viewers, .. }) => {
                    self.reported_counts.insert(*id, *viewers);
                },
                Some(ServerMessage::RemovedSession { id }) => {
                    self.reported_counts.remove(id);
                },
                _ => {},
            }
        }

        execute_actions(actions.clone(), &self.network);
        Ok(Outcome { actions })
    }

    /// Everything a connection has received.
    pub fn inbox(&self, connection_id: ConnectionId) -> Vec<ServerMessage> {
        self.network.inbox(connection_id)
    }

    /// Drain a connection's inbox.
    pub fn take_inbox(&self, connection_id: ConnectionId) -> Vec<ServerMessage> {
        self.network.take(connection_id)
    }

    /// Last viewer count announced for a session.
    pub fn reported_count(&self, session_id: SessionId) -> Option<usize> {
        self.reported_counts.get(&session_id).copied()
    }

    /// Move the virtual clock forward.
    pub fn advance(&self, by: Duration) {
        self.env.advance(by);
    }

    /// The driver under test.
    pub fn driver(&self) -> &ServerDriver<SimEnv> {
        &self.driver
    }

    /// The simulated network.
    pub fn network(&self) -> &SimNetwork {
        &self.network
    }

    /// Observable state for invariant checks.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::from_server(self)
    }
}

impl std::fmt::Debug for SimServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimServer")
            .field("driver", &self.driver)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}
