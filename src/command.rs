//! Command parser
//!
//! Classifies one trimmed, non-empty line from a client into a `Command`.
//! Lines that do not start with `/` are broadcasts. Slash commands only
//! split off the tokens they need (name, seconds, recipient); the trailing
//! message text is kept verbatim apart from trimming.

use thiserror::Error;

use crate::types::MAX_DELAY_SECS;

/// A parsed client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text sent to every other member
    Broadcast { text: String },
    /// `/list`
    List,
    /// `/pm <recipient> <text>` or `/send <recipient> <text>`
    PrivateMessage { recipient: String, text: String },
    /// `/delay <seconds> <recipient> <text>`
    DelayedMessage {
        delay_secs: u64,
        recipient: String,
        text: String,
    },
    /// Any other slash command
    Unknown { raw: String },
}

/// Malformed slash commands, reported back to the origin only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("usage: /pm <recipient> <message>")]
    PrivateMessageUsage,
    #[error("usage: /delay <time_seconds> <recipient> <message>")]
    DelayUsage,
    #[error("delay must be an integer between 1 and 86400 seconds")]
    InvalidDelay,
}

impl Command {
    /// Parse a trimmed line
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        if !line.starts_with('/') {
            return Ok(Command::Broadcast {
                text: line.to_string(),
            });
        }

        let (name, args) = split_token(line);
        match name {
            "/list" if args.is_empty() => Ok(Command::List),
            "/pm" | "/send" => parse_private(args),
            "/delay" => parse_delay(args),
            _ => Ok(Command::Unknown {
                raw: line.to_string(),
            }),
        }
    }
}

fn parse_private(args: &str) -> Result<Command, CommandError> {
    let (recipient, text) = split_token(args);
    if recipient.is_empty() || text.is_empty() {
        return Err(CommandError::PrivateMessageUsage);
    }
    Ok(Command::PrivateMessage {
        recipient: recipient.to_string(),
        text: text.to_string(),
    })
}

fn parse_delay(args: &str) -> Result<Command, CommandError> {
    let (seconds, rest) = split_token(args);
    let (recipient, text) = split_token(rest);
    if seconds.is_empty() || recipient.is_empty() {
        return Err(CommandError::DelayUsage);
    }

    let delay_secs = parse_delay_secs(seconds)?;
    if text.is_empty() {
        return Err(CommandError::DelayUsage);
    }

    Ok(Command::DelayedMessage {
        delay_secs,
        recipient: recipient.to_string(),
        text: text.to_string(),
    })
}

/// Base-10 integer in `[1, MAX_DELAY_SECS]`
fn parse_delay_secs(token: &str) -> Result<u64, CommandError> {
    match token.parse::<i64>() {
        Ok(secs) if (1..=MAX_DELAY_SECS as i64).contains(&secs) => Ok(secs as u64),
        _ => Err(CommandError::InvalidDelay),
    }
}

/// Split off the first whitespace-delimited token; the remainder is trimmed.
fn split_token(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], s[pos..].trim()),
        None => (s, ""),
    }
}
