//! ChatServer dispatcher and accept loop
//!
//! `ChatServer` executes parsed commands on behalf of a registered client.
//! Every effect is a send to one or more clients resolved through the
//! registry at dispatch time; a client that disconnects in between simply
//! misses the message.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::client::Client;
use crate::command::Command;
use crate::config::Limits;
use crate::handler::handle_connection;
use crate::message::ServerMessage;
use crate::registry::ClientRegistry;
use crate::scheduler::{DelayScheduler, DelayedTask};
use crate::types::ClientId;

/// The chat dispatcher
///
/// Shared by every connection handler through an `Arc`.
#[derive(Debug)]
pub struct ChatServer {
    registry: ClientRegistry,
    scheduler: DelayScheduler,
    limits: Limits,
}

impl ChatServer {
    /// Create a server with a fresh registry sized from `limits`
    pub fn new(limits: Limits) -> Self {
        let registry = ClientRegistry::new(limits.max_clients);
        let scheduler = DelayScheduler::new(registry.clone());
        Self {
            registry,
            scheduler,
            limits,
        }
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Parse one trimmed, non-empty line from `origin` and dispatch it.
    ///
    /// Malformed commands are answered with a usage notice to `origin` only.
    pub async fn handle_line(&self, origin: &Client, line: &str) {
        match Command::parse(line) {
            Ok(command) => self.dispatch(origin, command).await,
            Err(e) => {
                debug!("Rejected command from {}: {}", origin.name, e);
                send_or_log(origin, e.into()).await;
            }
        }
    }

    /// Execute one command
    pub async fn dispatch(&self, origin: &Client, command: Command) {
        match command {
            Command::Broadcast { text } => {
                let msg = ServerMessage::Chat {
                    from: origin.name.clone(),
                    text,
                };
                self.announce(origin.id, msg).await;
            }
            Command::List => self.handle_list(origin).await,
            Command::PrivateMessage { recipient, text } => {
                deliver_private(&self.registry, Some(origin), &origin.name, &recipient, text).await;
            }
            Command::DelayedMessage {
                delay_secs,
                recipient,
                text,
            } => {
                self.handle_delay(origin, delay_secs, recipient, text).await;
            }
            Command::Unknown { raw } => {
                debug!("Unknown command from {}: {}", origin.name, raw);
                send_or_log(origin, ServerMessage::unknown_command()).await;
            }
        }
    }

    /// Send `msg` to every registered client except `except`
    pub async fn announce(&self, except: ClientId, msg: ServerMessage) {
        let targets = self.registry.snapshot_except(except).await;
        for target in &targets {
            send_or_log(target, msg.clone()).await;
        }
    }

    async fn handle_list(&self, origin: &Client) {
        let names = self.registry.names().await;
        let msg = ServerMessage::user_list(&names, self.limits.list_capacity);
        send_or_log(origin, msg).await;
    }

    async fn handle_delay(&self, origin: &Client, delay_secs: u64, recipient: String, text: String) {
        let task = DelayedTask {
            delay_secs,
            sender_name: origin.name.clone(),
            recipient_name: recipient.clone(),
            text,
        };

        match self.scheduler.schedule(task) {
            Ok(()) => {
                info!(
                    "Scheduled PM from {} to {} in {} seconds",
                    origin.name, recipient, delay_secs
                );
                send_or_log(origin, ServerMessage::scheduled(&recipient, delay_secs)).await;
            }
            Err(e) => {
                error!("Failed to schedule PM from {}: {}", origin.name, e);
                send_or_log(origin, e.into()).await;
            }
        }
    }
}

/// Deliver a private message from `from` to the first client named `recipient`.
///
/// With an `origin`, lookup failures and self-addressed messages are reported
/// back to it. Without one (delayed delivery) they are only logged.
pub(crate) async fn deliver_private(
    registry: &ClientRegistry,
    origin: Option<&Client>,
    from: &str,
    recipient: &str,
    text: String,
) {
    let Some(target) = registry.find_by_name(recipient).await else {
        match origin {
            Some(origin) => send_or_log(origin, ServerMessage::user_not_found(recipient)).await,
            None => warn!(
                "Delayed PM recipient '{}' not found for message from {}",
                recipient, from
            ),
        }
        return;
    };

    if let Some(origin) = origin {
        if origin.id == target.id {
            send_or_log(origin, ServerMessage::self_pm()).await;
            return;
        }
    }

    let msg = ServerMessage::Private {
        from: from.to_string(),
        text,
    };
    send_or_log(&target, msg).await;
}

/// Send to a client, logging instead of failing if it is gone
async fn send_or_log(client: &Client, msg: ServerMessage) {
    if client.send(msg).await.is_err() {
        debug!("Dropping message for {} ({}): connection closed", client.name, client.id);
    }
}

/// Accept connections until `shutdown` is cancelled
///
/// Spawns one `handle_connection` task per accepted stream and, once
/// cancelled, waits for every handler to finish closing.
pub async fn serve(listener: TcpListener, server: Arc<ChatServer>, shutdown: CancellationToken) {
    let handlers = TaskTracker::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Accept loop stopped, closing {} connections", handlers.len());
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let server = Arc::clone(&server);
                    let shutdown = shutdown.clone();

                    handlers.spawn(async move {
                        if let Err(e) = handle_connection(stream, server, shutdown).await {
                            warn!("Connection from {} closed: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }

    handlers.close();
    handlers.wait().await;
}
