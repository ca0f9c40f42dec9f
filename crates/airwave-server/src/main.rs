//! Airwave server binary.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default port
//! airwave-server --bind 0.0.0.0:9000
//!
//! # Tighter limits, verbose logs
//! airwave-server --max-connections 500 --max-chat-len 500 --log-level debug
//! ```

use airwave_server::{DriverConfig, Server, ServerRuntimeConfig};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Airwave live session signaling server
#[derive(Parser, Debug)]
#[command(name = "airwave-server")]
#[command(about = "Signaling, session and chat server for live broadcasts")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:9000")]
    bind: String,

    /// Maximum concurrent connections
    #[arg(long, default_value = "10000")]
    max_connections: usize,

    /// Maximum session title length, in characters
    #[arg(long, default_value = "200")]
    max_title_len: usize,

    /// Maximum chat message length, in characters
    #[arg(long, default_value = "2000")]
    max_chat_len: usize,

    /// Largest accepted WebSocket message, in bytes
    #[arg(long, default_value = "65536")]
    max_frame_bytes: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Airwave server starting");
    tracing::info!("Binding to {}", args.bind);

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        max_frame_bytes: args.max_frame_bytes,
        driver: DriverConfig {
            max_connections: args.max_connections,
            max_title_len: args.max_title_len,
            max_chat_len: args.max_chat_len,
        },
    };

    let server = Server::bind(config).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
