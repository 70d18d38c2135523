//! Line-based TCP Chat Server Library
//!
//! A multi-client chat server: clients connect over TCP, register a display
//! name with their first line, then exchange broadcasts, private messages
//! and delayed private messages.
//!
//! # Protocol
//! - First line: display name (trimmed, non-empty)
//! - `text` broadcasts `<name>: text` to every other member
//! - `/list` lists registered names
//! - `/pm <name> <text>` (alias `/send`) sends `(PM from <name>): text`
//! - `/delay <seconds> <name> <text>` sends the PM after 1..=86400 seconds
//! - Server notices are prefixed with `Server: `
//!
//! # Architecture
//! - `ClientRegistry` is the shared membership table behind one mutex,
//!   locked per operation and never across a send
//! - Each connection has a `handler` task reading lines and a writer task
//!   draining a bounded `mpsc` channel into the socket
//! - `ChatServer` dispatches parsed commands; `DelayScheduler` spawns one
//!   timer task per delayed message
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tokio_util::sync::CancellationToken;
//! use chat_server::{serve, ChatServer, Limits};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:9000").await.unwrap();
//!     let server = Arc::new(ChatServer::new(Limits::default()));
//!     serve(listener, server, CancellationToken::new()).await;
//! }
//! ```

pub mod client;
pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod scheduler;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use client::Client;
pub use codec::{CodecError, LineCodec};
pub use command::{Command, CommandError};
pub use config::{Limits, ServerConfig};
pub use error::{AppError, SendError};
pub use handler::handle_connection;
pub use message::ServerMessage;
pub use registry::ClientRegistry;
pub use scheduler::{DelayScheduler, DelayedTask};
pub use server::{serve, ChatServer};
pub use types::ClientId;
