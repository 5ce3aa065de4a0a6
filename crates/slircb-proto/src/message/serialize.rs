//! Message serialization: `Display` for [`Message`].
//!
//! The wire contract: the command, one space before each arg, a trailing
//! space, then `:` plus the trailing value when it is non-empty, then CRLF.
//! A message with args and an empty trailing therefore ends with a space
//! before the CRLF. Arguments are trusted input; callers keep spaces and
//! line endings out of them.

use std::fmt::{self, Display, Formatter};

use super::types::Message;

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        write!(f, " ")?;
        if !self.trailing.is_empty() {
            write!(f, ":{}", self.trailing)?;
        }
        write!(f, "\r\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_with_trailing() {
        let msg = Message::privmsg("#chan", "hello world");
        assert_eq!(msg.to_string(), "PRIVMSG #chan :hello world\r\n");
    }

    #[test]
    fn serialize_empty_trailing_keeps_space() {
        let msg = Message::mode("#chan", "+o", Some("alice"));
        assert_eq!(msg.to_string(), "MODE #chan +o alice \r\n");
    }

    #[test]
    fn serialize_no_args() {
        let msg = Message::new("PONG", Vec::new(), "server.example");
        assert_eq!(msg.to_string(), "PONG :server.example\r\n");
    }
}
