//! Client struct definition
//!
//! Represents a registered participant: identity, display name and the
//! channel feeding that connection's writer task.

use std::net::SocketAddr;

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ClientId;

/// Connected client handle
///
/// Cloning a `Client` clones the outbound channel, not the transport.
/// The connection's writer task ends once every clone has been dropped.
#[derive(Debug, Clone)]
pub struct Client {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Display name, fixed at handshake
    pub name: String,
    /// Remote address (informational)
    pub addr: Option<SocketAddr>,
    /// Server → Client message channel
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Client {
    /// Create a new client with the given ID, name and sender channel
    pub fn new(
        id: ClientId,
        name: impl Into<String>,
        addr: Option<SocketAddr>,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            addr,
            sender,
        }
    }

    /// Send a message to this client
    ///
    /// Waits while the outbound channel is full. Returns an error if the
    /// channel is closed (client disconnected).
    pub async fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }
}
