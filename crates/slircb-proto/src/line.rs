//! Line-based codec for tokio.
//!
//! Decodes newline-terminated lines into `String`s and encodes outbound
//! [`Message`]s. Decoding stops at the framing layer on purpose: parsing a
//! line into a [`Message`] can fail recoverably, and the connection manager
//! wants to drop a bad line without tearing down the stream.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, ProtocolError};
use crate::message::Message;
use crate::MAX_LINE_LEN;

/// Codec that reads CRLF-terminated lines and writes serialized messages.
pub struct LineCodec {
    /// Index of next byte to check for a newline.
    next_index: usize,
    /// Maximum line length in bytes.
    max_len: usize,
}

impl LineCodec {
    /// Create a codec with the standard 512-byte line limit.
    pub fn new() -> Self {
        Self {
            next_index: 0,
            max_len: MAX_LINE_LEN,
        }
    }

    /// Create a codec with a custom maximum line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let data = String::from_utf8(line.to_vec())?;
            Ok(Some(data))
        } else {
            // No complete line yet; remember where we stopped scanning.
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<Message> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> error::Result<()> {
        dst.extend_from_slice(msg.to_string().as_bytes());
        Ok(())
    }
}
