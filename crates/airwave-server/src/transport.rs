//! WebSocket transport.
//!
//! Plain TCP listener plus a tungstenite upgrade. The upgrade request is where
//! the external auth layer hands over the caller's identity: a reverse proxy
//! in front of the server sets `x-airwave-user-id` and `x-airwave-user-name`
//! after it has authenticated the request. Frames larger than the configured
//! limit are refused by tungstenite before they reach the driver.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    WebSocketStream,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        http::HeaderMap,
        protocol::WebSocketConfig,
    },
};

use crate::{error::ServerError, registry::Identity};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-airwave-user-id";

/// Header carrying the authenticated display name.
pub const USER_NAME_HEADER: &str = "x-airwave-user-name";

/// TCP listener that hands out upgraded WebSocket streams.
pub struct WsTransport {
    listener: TcpListener,
    max_frame_bytes: usize,
}

impl WsTransport {
    /// Bind a listener.
    pub async fn bind(address: &str, max_frame_bytes: usize) -> Result<Self, ServerError> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid bind address '{address}': {e}")))?;

        if max_frame_bytes == 0 {
            return Err(ServerError::Config("max frame size must be positive".to_string()));
        }

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("WebSocket transport bound to {}", listener.local_addr()?);

        Ok(Self { listener, max_frame_bytes })
    }

    /// Accept the next TCP connection. The upgrade happens in [`upgrade`].
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ServerError> {
        Ok(self.listener.accept().await?)
    }

    /// Local address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Frame size limit applied on upgrade.
    pub fn max_frame_bytes(&self) -> usize {
        self.max_frame_bytes
    }
}

/// Perform the WebSocket handshake and read the caller's identity.
pub async fn upgrade(
    stream: TcpStream,
    max_frame_bytes: usize,
) -> Result<(WebSocketStream<TcpStream>, Option<Identity>), ServerError> {
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(max_frame_bytes);
    config.max_frame_size = Some(max_frame_bytes);

    let mut identity = None;
    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        identity = identity_from_headers(request.headers());
        Ok(response)
    };

    let ws = tokio_tungstenite::accept_hdr_async_with_config(stream, callback, Some(config)).await?;
    Ok((ws, identity))
}

/// Identity from the upgrade headers.
///
/// The user id is required; a missing name falls back to the id.
pub fn identity_from_headers(headers: &HeaderMap) -> Option<Identity> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let user_id = header(USER_ID_HEADER)?;
    let name = header(USER_NAME_HEADER).unwrap_or_else(|| user_id.clone());
    Some(Identity { user_id, name })
}
