//! TCP connection handler
//!
//! Drives one connection through its lifecycle:
//! registering (first line is the display name), active (read lines,
//! parse, dispatch), and closing (unregister, announce the departure,
//! flush and close the socket).
//!
//! Writes go through a per-connection writer task fed by a bounded channel,
//! so the registry only ever stores channel handles.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::codec::LineCodec;
use crate::error::AppError;
use crate::message::ServerMessage;
use crate::server::ChatServer;
use crate::types::{truncate_name, ClientId};

/// Outbound messages buffered per client before senders wait
const OUTBOUND_BUFFER_SIZE: usize = 64;

/// Why an active connection is being closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Departure {
    /// Peer closed its side
    Eof,
    /// Server shutting down
    Shutdown,
    /// Read failed
    ReadError,
    /// Writer task ended (write failed)
    WriteError,
}

impl Departure {
    fn farewell(self, name: &str) -> ServerMessage {
        match self {
            Departure::Eof | Departure::Shutdown => ServerMessage::left(name),
            Departure::ReadError | Departure::WriteError => ServerMessage::left_with_error(name),
        }
    }
}

/// Handle a new TCP connection
///
/// Returns once the connection is closed and removed from the registry.
/// Errors are only returned for connections that never became active.
pub async fn handle_connection(
    stream: TcpStream,
    server: Arc<ChatServer>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let peer_addr = stream.peer_addr().ok();
    let limits = server.limits().clone();

    let (read_half, write_half) = stream.into_split();
    let mut lines = FramedRead::new(read_half, LineCodec::new(limits.max_line_length));

    // Registering: the first line is the display name
    let first = tokio::select! {
        _ = shutdown.cancelled() => return Ok(()),
        first = lines.next() => first,
    };
    let raw_name = match first {
        Some(Ok(line)) => line,
        Some(Err(e)) => return Err(e.into()),
        None => {
            debug!("Connection from {:?} closed before registering", peer_addr);
            return Ok(());
        }
    };

    let name = truncate_name(&raw_name, limits.max_name_length).to_string();
    if name.is_empty() {
        return Err(AppError::EmptyName);
    }

    let (msg_tx, msg_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER_SIZE);
    let mut writer = tokio::spawn(write_loop(write_half, msg_rx));

    let client = Client::new(ClientId::new(), name, peer_addr, msg_tx);

    if let Err(e) = server.registry().register(client.clone()).await {
        info!("Rejecting '{}' from {:?}: {}", client.name, client.addr, e);
        let _ = client.send(ServerMessage::from(e)).await;
        drop(client);
        let _ = writer.await;
        return Err(AppError::ServerFull);
    }

    // Active
    info!(
        "Client joined: {} ({}) from {:?}",
        client.name, client.id, client.addr
    );
    server
        .announce(client.id, ServerMessage::joined(&client.name))
        .await;

    let departure = loop {
        tokio::select! {
            _ = shutdown.cancelled() => break Departure::Shutdown,
            _ = &mut writer => break Departure::WriteError,
            frame = lines.next() => match frame {
                Some(Ok(line)) => {
                    if line.is_empty() {
                        continue;
                    }
                    debug!("Received from {}: {}", client.name, line);
                    server.handle_line(&client, &line).await;
                }
                Some(Err(e)) => {
                    warn!("Read error for {} ({}): {}", client.name, client.id, e);
                    break Departure::ReadError;
                }
                None => break Departure::Eof,
            },
        }
    };

    // Closing
    server.registry().unregister(client.id).await;
    server
        .announce(client.id, departure.farewell(&client.name))
        .await;
    info!(
        "Client disconnected: {} ({}) from {:?}: {:?}",
        client.name, client.id, client.addr, departure
    );

    // Closed: dropping the last handle lets the writer flush and shut down
    drop(client);
    if departure != Departure::WriteError {
        let _ = writer.await;
    }

    Ok(())
}

/// Drain the outbound channel into the socket until every sender is gone
async fn write_loop(write_half: OwnedWriteHalf, mut msg_rx: mpsc::Receiver<ServerMessage>) {
    let mut sink = FramedWrite::new(write_half, LineCodec::default());

    while let Some(msg) = msg_rx.recv().await {
        if let Err(e) = sink.send(msg).await {
            debug!("Write failed, ending write task: {}", e);
            return;
        }
    }

    let _ = sink.close().await;
    debug!("Write task ended");
}
