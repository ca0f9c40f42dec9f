//! Action execution.
//!
//! Runs the [`ServerAction`]s produced by the driver against an [`Outbound`]
//! capability, strictly in order. Each message is encoded once and the same
//! text goes to every recipient. Delivery failures are logged and skipped:
//! a broken connection is cleaned up by its own close event, never by the
//! executor.

use airwave_proto::ConnectionId;

use crate::{
    driver::{LogLevel, ServerAction},
    server_error::ExecutorError,
};

/// Delivery side of the connection registry.
///
/// The WebSocket runtime and the simulation network both implement this.
pub trait Outbound {
    /// Queue an encoded frame for one connection.
    fn deliver(&self, connection_id: ConnectionId, frame: &str) -> Result<(), ExecutorError>;

    /// Close a connection after its queued frames.
    fn close(&self, connection_id: ConnectionId, reason: &str);
}

/// Execute actions in order. Returns the number of frames delivered.
pub fn execute_actions<I, O>(actions: Vec<ServerAction<I>>, outbound: &O) -> usize
where
    O: Outbound + ?Sized,
{
    let mut delivered = 0;

    for action in actions {
        match action {
            ServerAction::SendToConnection { .. }
            | ServerAction::BroadcastToRoom { .. }
            | ServerAction::BroadcastToAll { .. } => {
                delivered += deliver_message(&action, outbound);
            },

            ServerAction::CloseConnection { connection_id, reason } => {
                tracing::info!("closing {}: {}", connection_id, reason);
                outbound.close(connection_id, &reason);
            },

            ServerAction::Log { level, message, .. } => match level {
                LogLevel::Debug => tracing::debug!("{}", message),
                LogLevel::Info => tracing::info!("{}", message),
                LogLevel::Warn => tracing::warn!("{}", message),
                LogLevel::Error => tracing::error!("{}", message),
            },
        }
    }

    delivered
}

fn deliver_message<I, O>(action: &ServerAction<I>, outbound: &O) -> usize
where
    O: Outbound + ?Sized,
{
    let Some(message) = action.message() else {
        return 0;
    };

    let frame = match message.encode().map_err(ExecutorError::from) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!("dropping {}: {}", message.name(), e);
            return 0;
        },
    };

    let mut delivered = 0;
    for &connection_id in action.recipients() {
        match outbound.deliver(connection_id, &frame) {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!("{} not delivered: {}", message.name(), e),
        }
    }
    delivered
}
