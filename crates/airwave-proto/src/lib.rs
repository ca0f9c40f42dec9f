//! Airwave wire protocol.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": {...}}`. Inbound frames decode into
//! [`ClientMessage`], outbound frames are built from [`ServerMessage`].
//!
//! Negotiation payloads (offers, answers, ICE candidates) travel as opaque
//! [`serde_json::Value`] blobs. The server never looks inside them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chat;
mod client;
mod errors;
mod ids;
mod server;

pub use chat::{ChatMessage, SessionSummary};
pub use client::ClientMessage;
pub use errors::{ErrorPayload, ProtocolError, Result};
pub use ids::{ConnectionId, SessionId};
pub use server::ServerMessage;

/// Opaque negotiation blob relayed between peers.
pub type NegotiationPayload = serde_json::Value;
