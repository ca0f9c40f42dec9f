//! Airwave signaling server.
//!
//! Production server that coordinates live sessions over WebSocket, using
//! Tokio for the async runtime and system time with OS randomness.
//!
//! # Architecture
//!
//! The [`ServerDriver`] follows the Sans-IO pattern: it turns events into
//! actions and never touches a socket. [`Server`] is the production glue that
//! feeds it events from WebSocket connections and executes its actions.
//!
//! Every event is processed and its actions executed under one lock, so the
//! session store sees a single serialized event stream. Execution only pushes
//! text into per-connection channels; a writer task per connection drains its
//! channel onto the socket, which keeps per-connection order and never blocks
//! the lock on the network.
//!
//! # Components
//!
//! - [`ServerDriver`]: Action-based orchestrator (pure logic, no I/O)
//! - [`ConnectionRegistry`]: Connection identity and room membership
//! - [`execute_actions`]: Runs actions against an [`Outbound`] capability
//! - [`Server`]: Production runtime over [`WsTransport`]
//! - [`SystemEnv`]: Production environment (real time, OS RNG)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chat;
mod driver;
mod error;
mod executor;
mod lifecycle;
mod registry;
mod relay;
mod server_error;
mod system_env;
mod transport;

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use airwave_proto::{ClientMessage, ConnectionId};
pub use driver::{LogLevel, ServerAction, ServerConfig as DriverConfig, ServerDriver, ServerEvent};
pub use error::ServerError;
pub use executor::{Outbound, execute_actions};
use futures_util::{SinkExt, StreamExt};
pub use registry::{ConnectionInfo, ConnectionRegistry, Identity};
pub use server_error::{ExecutorError, ServerError as DriverError};
pub use system_env::SystemEnv;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::tungstenite::Message;
pub use transport::{USER_ID_HEADER, USER_NAME_HEADER, WsTransport, identity_from_headers};

/// Default frame size limit: 64 KiB.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;

/// Shared delivery state for all connections.
///
/// Maps each open connection to the channel its writer task drains.
#[derive(Default)]
struct SharedState {
    outbound: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<Message>>>,
}

impl SharedState {
    fn register(&self, connection_id: ConnectionId, sender: mpsc::UnboundedSender<Message>) {
        self.outbound.write().unwrap_or_else(PoisonError::into_inner).insert(connection_id, sender);
    }

    fn remove(&self, connection_id: ConnectionId) -> Option<mpsc::UnboundedSender<Message>> {
        self.outbound.write().unwrap_or_else(PoisonError::into_inner).remove(&connection_id)
    }

    fn is_open(&self, connection_id: ConnectionId) -> bool {
        self.outbound.read().unwrap_or_else(PoisonError::into_inner).contains_key(&connection_id)
    }
}

impl Outbound for SharedState {
    fn deliver(&self, connection_id: ConnectionId, frame: &str) -> Result<(), ExecutorError> {
        let outbound = self.outbound.read().unwrap_or_else(PoisonError::into_inner);
        let sender = outbound.get(&connection_id).ok_or_else(|| ExecutorError::SendFailed {
            connection_id,
            reason: "connection not open".to_string(),
        })?;

        sender.send(Message::Text(frame.to_string())).map_err(|_| ExecutorError::SendFailed {
            connection_id,
            reason: "writer stopped".to_string(),
        })
    }

    fn close(&self, connection_id: ConnectionId, reason: &str) {
        // Dropping the sender lets the writer flush what is queued and stop.
        if let Some(sender) = self.remove(connection_id) {
            tracing::debug!("close frame queued for {}: {}", connection_id, reason);
            let _ = sender.send(Message::Close(None));
        }
    }
}

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:9000")
    pub bind_address: String,
    /// Largest accepted WebSocket message, in bytes
    pub max_frame_bytes: usize,
    /// Driver configuration (limits)
    pub driver: DriverConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9000".to_string(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            driver: DriverConfig::default(),
        }
    }
}

type SharedDriver = Arc<tokio::sync::Mutex<ServerDriver<SystemEnv>>>;

/// Production Airwave server.
///
/// Wraps `ServerDriver` with the WebSocket transport and system environment.
pub struct Server {
    /// The action-based server driver
    driver: ServerDriver<SystemEnv>,
    /// WebSocket listener
    transport: WsTransport,
}

impl Server {
    /// Create and bind a new server.
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        let driver = ServerDriver::new(SystemEnv::new(), config.driver);
        let transport = WsTransport::bind(&config.bind_address, config.max_frame_bytes).await?;

        Ok(Self { driver, transport })
    }

    /// Run the server, accepting connections and processing messages.
    ///
    /// This method runs until the task is cancelled or accepting fails hard.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("Server starting on {}", self.transport.local_addr()?);

        let driver: SharedDriver = Arc::new(tokio::sync::Mutex::new(self.driver));
        let shared = Arc::new(SharedState::default());
        let next_id = Arc::new(AtomicU64::new(1));
        let max_frame_bytes = self.transport.max_frame_bytes();

        loop {
            match self.transport.accept().await {
                Ok((stream, peer)) => {
                    let connection_id = ConnectionId(next_id.fetch_add(1, Ordering::Relaxed));
                    let driver = Arc::clone(&driver);
                    let shared = Arc::clone(&shared);

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(
                            stream,
                            connection_id,
                            max_frame_bytes,
                            driver,
                            shared,
                        )
                        .await
                        {
                            tracing::warn!(
                                "Connection {} from {} failed: {}",
                                connection_id,
                                peer,
                                e
                            );
                        }
                    });
                },
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                },
            }
        }
    }

    /// Local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.transport.local_addr()
    }
}

/// Handle a single WebSocket connection from upgrade to close.
async fn handle_connection(
    stream: TcpStream,
    connection_id: ConnectionId,
    max_frame_bytes: usize,
    driver: SharedDriver,
    shared: Arc<SharedState>,
) -> Result<(), ServerError> {
    let (ws, identity) = transport::upgrade(stream, max_frame_bytes).await?;
    let (mut sink, mut frames) = ws.split();

    let (sender, mut receiver) = mpsc::unbounded_channel::<Message>();
    shared.register(connection_id, sender);

    tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            let closing = matches!(message, Message::Close(_));
            if let Err(e) = sink.send(message).await {
                tracing::debug!("Writer for {} stopped: {}", connection_id, e);
                break;
            }
            if closing {
                break;
            }
        }
    });

    tracing::debug!("New connection: {}", connection_id);
    let accepted = ServerEvent::ConnectionAccepted { connection_id, identity };
    if let Err(e) = dispatch(&driver, &shared, accepted).await {
        shared.remove(connection_id);
        return Err(e.into());
    }

    let mut reason = "connection closed".to_string();

    while shared.is_open(connection_id) {
        let Some(frame) = frames.next().await else {
            break;
        };

        let event = match frame {
            Ok(Message::Text(text)) => match ClientMessage::decode(&text) {
                Ok(message) => ServerEvent::MessageReceived { connection_id, message },
                Err(e) => ServerEvent::MessageRejected { connection_id, reason: e.to_string() },
            },
            Ok(Message::Binary(_)) => ServerEvent::MessageRejected {
                connection_id,
                reason: "binary frames are not supported".to_string(),
            },
            Ok(Message::Close(_)) => break,
            // Ping/pong are answered by tungstenite
            Ok(_) => continue,
            Err(e) => {
                reason = e.to_string();
                break;
            },
        };

        if let Err(e) = dispatch(&driver, &shared, event).await {
            tracing::warn!("Event processing error: {}", e);
        }
    }

    shared.remove(connection_id);
    let closed = ServerEvent::ConnectionClosed { connection_id, reason };
    dispatch(&driver, &shared, closed).await?;

    Ok(())
}

/// Process one event and execute its actions under the driver lock.
async fn dispatch(
    driver: &SharedDriver,
    shared: &SharedState,
    event: ServerEvent,
) -> Result<(), DriverError> {
    let mut driver = driver.lock().await;
    let actions = driver.process_event(event)?;
    execute_actions(actions, shared);
    Ok(())
}
