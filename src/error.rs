//! Error types for the chat server
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::codec::CodecError;

/// Application-level errors
///
/// Covers fatal connection errors (the handler loop ends) and
/// registration/scheduling failures reported back to a single client.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal for the affected connection)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing error (fatal for the affected connection)
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Registry already holds the maximum number of clients
    #[error("Server is full")]
    ServerFull,

    /// Handshake line was empty after trimming
    #[error("Empty display name")]
    EmptyName,

    /// A delayed delivery could not be started
    #[error("Failed to schedule delayed message: {0}")]
    Schedule(String),
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
