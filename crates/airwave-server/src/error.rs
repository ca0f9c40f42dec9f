//! Runtime error types.

use crate::server_error::ServerError as DriverError;

/// Errors surfaced by the WebSocket runtime.
///
/// Only `Config` and a `Transport` failure while binding are fatal; the rest
/// end a single connection and the server keeps serving the others.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Bad configuration (unparseable bind address, zero frame limit).
    #[error("configuration error: {0}")]
    Config(String),

    /// Socket-level failure (bind, accept, local address).
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// WebSocket upgrade failed or the stream broke mid-handshake.
    #[error("handshake failed: {0}")]
    Handshake(#[from] tokio_tungstenite::tungstenite::Error),

    /// The driver refused an event.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}
