//! Reference world state.

use std::collections::BTreeSet;

use super::operation::{Operation, SessionRef};

/// Why an operation was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Session does not exist or has ended
    NotFound,
    /// Host tried to join its own session
    HostCannotWatch,
    /// Non-host tried to stop a session
    NotHost,
}

/// What an operation did, as the client experiences it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// New session, by creation index.
    Started {
        /// Index among all sessions ever started
        session: usize,
    },
    /// Joined (or re-joined) a session.
    Joined {
        /// Viewer count after the join
        count: usize,
        /// Messages in the replayed history
        history: usize,
    },
    /// Left a session.
    Left {
        /// Viewer count after the leave
        count: usize,
    },
    /// Leave for a session the client was not watching.
    NotWatching,
    /// Session ended on request.
    Stopped {
        /// Connections told the session ended
        notified: usize,
    },
    /// Chat message accepted.
    Posted {
        /// Whether it counts as monetized
        super_chat: bool,
        /// Normalized amount
        amount: u64,
    },
    /// Chat to a missing session, silently dropped.
    Dropped,
    /// Session list returned.
    Listed {
        /// Active sessions
        sessions: usize,
    },
    /// Connection dropped.
    Disconnected {
        /// Sessions ended because the client hosted them
        ended: usize,
        /// Sessions the client stopped watching
        left: usize,
    },
    /// New connection opened.
    Reconnected,
    /// Reconnect while still online.
    AlreadyOnline,
    /// The client is offline and could not act.
    Offline,
    /// Request declined.
    Failed(OperationError),
}

/// One session in the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSession {
    /// Hosting client
    pub host: usize,
    /// Watching clients
    pub viewers: BTreeSet<usize>,
    /// `(is_super_chat, amount)` per message, in log order
    pub chat: Vec<(bool, u64)>,
    /// False once ended
    pub active: bool,
}

/// Comparable view of one active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableSession {
    /// Creation index
    pub index: usize,
    /// Hosting client
    pub host: usize,
    /// Watching clients
    pub viewers: BTreeSet<usize>,
    /// `(is_super_chat, amount)` per message
    pub chat: Vec<(bool, u64)>,
}

/// Comparable view of the whole system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Online flag per client
    pub online: Vec<bool>,
    /// Active sessions by creation index
    pub sessions: Vec<ObservableSession>,
}

/// Reference model of the server plus its clients.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    online: Vec<bool>,
    sessions: Vec<ModelSession>,
}

impl ModelWorld {
    /// World with `num_clients` clients, all online.
    pub fn new(num_clients: usize) -> Self {
        Self { online: vec![true; num_clients.max(1)], sessions: Vec::new() }
    }

    /// Number of clients.
    pub fn num_clients(&self) -> usize {
        self.online.len()
    }

    /// Client index an operation acts for.
    pub fn client_index(&self, op: &Operation) -> usize {
        op.client_id() as usize % self.online.len()
    }

    /// Session index a reference resolves to. `None` before any start.
    pub fn session_index(&self, session: SessionRef) -> Option<usize> {
        if self.sessions.is_empty() {
            None
        } else {
            Some(session as usize % self.sessions.len())
        }
    }

    /// Every session ever started, by creation index.
    pub fn sessions(&self) -> &[ModelSession] {
        &self.sessions
    }

    /// Apply an operation and report its result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        let client = self.client_index(op);

        if let Operation::Reconnect { .. } = op {
            if self.online[client] {
                return OperationResult::AlreadyOnline;
            }
            self.online[client] = true;
            return OperationResult::Reconnected;
        }

        if !self.online[client] {
            return OperationResult::Offline;
        }

        match *op {
            Operation::Start { .. } => {
                self.sessions.push(ModelSession {
                    host: client,
                    viewers: BTreeSet::new(),
                    chat: Vec::new(),
                    active: true,
                });
                OperationResult::Started { session: self.sessions.len() - 1 }
            },

            Operation::Join { session, .. } => {
                let Some(s) = self.active_session(session) else {
                    return OperationResult::Failed(OperationError::NotFound);
                };
                if s.host == client {
                    return OperationResult::Failed(OperationError::HostCannotWatch);
                }
                s.viewers.insert(client);
                OperationResult::Joined { count: s.viewers.len(), history: s.chat.len() }
            },

            Operation::Leave { session, .. } => {
                let Some(s) = self.active_session(session) else {
                    return OperationResult::NotWatching;
                };
                if s.viewers.remove(&client) {
                    OperationResult::Left { count: s.viewers.len() }
                } else {
                    OperationResult::NotWatching
                }
            },

            Operation::Stop { session, .. } => {
                let Some(s) = self.active_session(session) else {
                    return OperationResult::Failed(OperationError::NotFound);
                };
                if s.host != client {
                    return OperationResult::Failed(OperationError::NotHost);
                }
                let notified = 1 + s.viewers.len();
                end(s);
                OperationResult::Stopped { notified }
            },

            Operation::Chat { session, super_chat, amount, .. } => {
                let Some(s) = self.active_session(session) else {
                    return OperationResult::Dropped;
                };
                let amount = if super_chat { u64::from(amount) } else { 0 };
                s.chat.push((super_chat, amount));
                OperationResult::Posted { super_chat, amount }
            },

            Operation::List { .. } => {
                let sessions = self.sessions.iter().filter(|s| s.active).count();
                OperationResult::Listed { sessions }
            },

            Operation::Disconnect { .. } => {
                self.online[client] = false;
                let (mut ended, mut left) = (0, 0);
                for s in self.sessions.iter_mut().filter(|s| s.active) {
                    if s.host == client {
                        end(s);
                        ended += 1;
                    } else if s.viewers.remove(&client) {
                        left += 1;
                    }
                }
                OperationResult::Disconnected { ended, left }
            },

            Operation::Reconnect { .. } => OperationResult::AlreadyOnline,
        }
    }

    /// Comparable state.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            online: self.online.clone(),
            sessions: self
                .sessions
                .iter()
                .enumerate()
                .filter(|(_, s)| s.active)
                .map(|(index, s)| ObservableSession {
                    index,
                    host: s.host,
                    viewers: s.viewers.clone(),
                    chat: s.chat.clone(),
                })
                .collect(),
        }
    }

    fn active_session(&mut self, session: SessionRef) -> Option<&mut ModelSession> {
        let index = self.session_index(session)?;
        self.sessions.get_mut(index).filter(|s| s.active)
    }
}

fn end(session: &mut ModelSession) {
    session.active = false;
    session.viewers.clear();
    session.chat.clear();
}
