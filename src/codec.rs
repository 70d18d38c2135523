//! Newline line codec
//!
//! Frames the TCP byte stream into `\n`-terminated text lines and writes
//! `ServerMessage`s back with a `\n` terminator.
//!
//! Lines are decoded with lossy UTF-8 and trimmed. Empty lines are still
//! yielded (as `""`) so the handler can tell an empty handshake apart from
//! silence. Oversized lines are discarded instead of closing the connection:
//! once the buffer holds more than `max_line_length` bytes without a
//! terminator, the partial data is dropped and the codec skips ahead to the
//! next `\n`.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::message::ServerMessage;

/// Default accumulation limit for one line, terminator excluded
pub const DEFAULT_MAX_LINE_LENGTH: usize = 2048;

/// Codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct LineCodec {
    max_line_length: usize,
    /// Index already scanned for `\n` in the current buffer
    next_index: usize,
    /// True while discarding the tail of an oversized line
    skipping: bool,
}

impl LineCodec {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            next_index: 0,
            skipping: false,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, CodecError> {
        loop {
            let newline = src[self.next_index..]
                .iter()
                .position(|b| *b == b'\n')
                .map(|offset| self.next_index + offset);

            match newline {
                Some(pos) if self.skipping => {
                    debug!(bytes = pos + 1, "codec: finished skipping oversized line tail");
                    src.advance(pos + 1);
                    self.next_index = 0;
                    self.skipping = false;
                }
                Some(pos) if pos > self.max_line_length => {
                    warn!(bytes = pos, "codec: discarded oversized line");
                    src.advance(pos + 1);
                    self.next_index = 0;
                }
                Some(pos) => {
                    let line = src.split_to(pos + 1);
                    self.next_index = 0;
                    let text = String::from_utf8_lossy(&line[..pos]);
                    return Ok(Some(text.trim().to_string()));
                }
                None if self.skipping => {
                    src.clear();
                    self.next_index = 0;
                    return Ok(None);
                }
                None if src.len() > self.max_line_length => {
                    warn!(
                        bytes = src.len(),
                        "codec: line buffer overflow, discarding partial line"
                    );
                    src.clear();
                    self.next_index = 0;
                    self.skipping = true;
                    return Ok(None);
                }
                None => {
                    self.next_index = src.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, CodecError> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if !src.is_empty() {
            debug!(bytes = src.len(), "codec: dropping unterminated line at EOF");
            src.clear();
        }
        self.next_index = 0;
        Ok(None)
    }
}

impl Encoder<ServerMessage> for LineCodec {
    type Error = CodecError;

    fn encode(&mut self, item: ServerMessage, dst: &mut BytesMut) -> Result<(), CodecError> {
        let line = item.to_string();
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
