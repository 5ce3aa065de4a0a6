//! # slircb-proto
//!
//! IRC wire protocol support for the slircb bot framework.
//!
//! This crate covers the byte-level half of the job:
//!
//! - [`Message`] and [`User`] — the parsed representation of one IRC line
//! - parsing (`str::parse::<Message>()`) and serialization (`Display`)
//! - [`LineCodec`] — a tokio codec that frames CRLF-delimited lines and
//!   encodes outbound messages
//! - [`BotStream`] — one stream type over plain TCP and client-side TLS
//! - outbound constructors (`Message::privmsg`, `Message::kick`, ...)
//!
//! ## Quick start
//!
//! ```rust
//! use slircb_proto::Message;
//!
//! let msg: Message = ":nick!user@host PRIVMSG #chan :hello world\r\n".parse().unwrap();
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.args, vec!["#chan"]);
//! assert_eq!(msg.trailing, "hello world");
//!
//! let out = Message::privmsg("#chan", "hi there");
//! assert_eq!(out.to_string(), "PRIVMSG #chan :hi there\r\n");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod line;
pub mod message;
pub mod transport;
pub mod user;

pub use self::error::ProtocolError;
pub use self::line::LineCodec;
pub use self::message::Message;
pub use self::transport::{enable_keepalive, BotStream};
pub use self::user::User;

/// Maximum IRC line length in bytes, terminator included (RFC 1459).
pub const MAX_LINE_LEN: usize = 512;
