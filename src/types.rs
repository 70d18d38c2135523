//! Basic type definitions for the chat server
//!
//! Provides the `ClientId` newtype and the protocol limits shared by the
//! server and the client binary.

use uuid::Uuid;

/// Maximum display name length in bytes
pub const MAX_NAME_LENGTH: usize = 31;

/// Longest accepted delay for `/delay`, in seconds (one day)
pub const MAX_DELAY_SECS: u64 = 86_400;

/// Unique client identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe client identification.
/// Two clients may share a display name, never a `ClientId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Truncate a display name to at most `max_len` bytes on a char boundary.
///
/// Whitespace left at the end by the cut is trimmed, so the result is
/// always a valid `/pm` recipient token.
pub fn truncate_name(name: &str, max_len: usize) -> &str {
    if name.len() <= max_len {
        return name;
    }
    let mut end = max_len;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].trim_end()
}
