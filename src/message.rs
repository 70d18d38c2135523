//! Outbound message definitions
//!
//! Every line the server writes to a client is a `ServerMessage`.
//! `Display` renders the wire text without the trailing newline;
//! the line codec appends it.

use std::fmt;

use crate::command::CommandError;
use crate::error::AppError;

/// Prefix separating server notices from other members' messages
pub const SERVER_PREFIX: &str = "Server";

const LIST_HEADER: &str = "Server: Connected users:";
const LIST_EMPTY: &str = "(No users connected)";
const LIST_TRUNCATED: &str = "- ... (list truncated)";

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Broadcast from another member: `<from>: <text>`
    Chat { from: String, text: String },
    /// Private message: `(PM from <from>): <text>`
    Private { from: String, text: String },
    /// Informational, error or confirmation notice: `Server: <text>`
    Notice(String),
    /// Pre-rendered, possibly multi-line `/list` response
    UserList(String),
}

impl ServerMessage {
    /// Build a `Server: ...` notice
    pub fn notice(text: impl Into<String>) -> Self {
        ServerMessage::Notice(text.into())
    }

    pub fn joined(name: &str) -> Self {
        Self::notice(format!("{} joined the chat room.", name))
    }

    pub fn left(name: &str) -> Self {
        Self::notice(format!("{} left the chat room.", name))
    }

    pub fn left_with_error(name: &str) -> Self {
        Self::notice(format!("{} left due to an error.", name))
    }

    pub fn user_not_found(name: &str) -> Self {
        Self::notice(format!("User '{}' not found or is offline.", name))
    }

    pub fn self_pm() -> Self {
        Self::notice("You cannot send a PM to yourself.")
    }

    pub fn scheduled(recipient: &str, delay_secs: u64) -> Self {
        Self::notice(format!(
            "Message to {} scheduled in {} seconds.",
            recipient, delay_secs
        ))
    }

    pub fn unknown_command() -> Self {
        Self::notice("Unknown command.")
    }

    /// Render the `/list` response for `names`, capped at `capacity` bytes.
    ///
    /// Entries are added in order while they fit; once one does not, the
    /// listing stops and a truncation marker is appended. Space for the
    /// marker is always reserved, so the rendered text never exceeds
    /// `capacity` unless the header alone does.
    pub fn user_list<S: AsRef<str>>(names: &[S], capacity: usize) -> Self {
        let mut out = String::from(LIST_HEADER);

        if names.is_empty() {
            out.push('\n');
            out.push_str(LIST_EMPTY);
            return ServerMessage::UserList(out);
        }

        let reserved = LIST_TRUNCATED.len() + 1;
        for (i, name) in names.iter().enumerate() {
            let entry = format!("\n- {}", name.as_ref());
            let is_last = i + 1 == names.len();
            let budget = if is_last { capacity } else { capacity.saturating_sub(reserved) };
            if out.len() + entry.len() > budget {
                out.push('\n');
                out.push_str(LIST_TRUNCATED);
                break;
            }
            out.push_str(&entry);
        }

        ServerMessage::UserList(out)
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Chat { from, text } => write!(f, "{}: {}", from, text),
            ServerMessage::Private { from, text } => write!(f, "(PM from {}): {}", from, text),
            ServerMessage::Notice(text) => write!(f, "{}: {}", SERVER_PREFIX, text),
            ServerMessage::UserList(text) => f.write_str(text),
        }
    }
}

/// Convert a command usage error into the notice sent to its origin
impl From<CommandError> for ServerMessage {
    fn from(err: CommandError) -> Self {
        let text = match err {
            CommandError::PrivateMessageUsage => "Usage /pm <recipient> <message>",
            CommandError::DelayUsage => "Usage /delay <time_seconds> <recipient> <message>",
            CommandError::InvalidDelay => {
                "Invalid time (must be positive integer seconds, max 86400)."
            }
        };
        ServerMessage::notice(text)
    }
}

/// Convert AppError to ServerMessage for client notification
impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        match err {
            AppError::ServerFull => ServerMessage::notice("Server is full, try again later."),
            AppError::Schedule(_) => ServerMessage::notice("Failed to schedule message."),
            // Fatal errors are not typically converted (connection closes)
            _ => ServerMessage::notice("Internal error."),
        }
    }
}
