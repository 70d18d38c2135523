//! Line Chat Server - Entry Point
//!
//! Parses the port, binds the TCP listener and runs the accept loop until
//! Ctrl+C.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_server::{serve, ChatServer, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Exits with a usage message on a missing or invalid port
    let config = ServerConfig::parse();

    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_server=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_server=info")),
        )
        .init();

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let server = Arc::new(ChatServer::new(config.limits.clone()));
    let shutdown = CancellationToken::new();

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl+C received, shutting down");
                ctrl_c.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    serve(listener, server, shutdown).await;

    info!("Server stopped");
    Ok(())
}
