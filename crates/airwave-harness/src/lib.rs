//! Deterministic simulation harness for Airwave.
//!
//! Runs the real [`ServerDriver`](airwave_server::ServerDriver) against a
//! seeded [`SimEnv`] and an in-memory [`SimNetwork`], so whole scenarios
//! (connect, start, join, chat, disconnect) replay identically from a seed.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and the simulated
//! server, and their results and observable states are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks properties that must hold after every
//! event, whatever sequence led there. Use [`InvariantRegistry::standard()`]
//! for the session invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod model;
pub mod sim_env;
pub mod sim_network;
pub mod sim_server;

pub use invariants::{
    HostNeverViewer, Invariant, InvariantRegistry, InvariantResult, NoOrphanRooms,
    ParticipantsConnected, ReportedCountIsTrue, RoomMatchesRoles, SessionSnapshot,
    SystemSnapshot, Violation,
};
pub use model::{
    ClientId, ModelSession, ModelWorld, ObservableSession, ObservableState, Operation,
    OperationError, OperationResult, SessionRef,
};
pub use sim_env::SimEnv;
pub use sim_network::SimNetwork;
pub use sim_server::{Outcome, SimServer};
