//! Message parsing: `FromStr` for [`Message`].

use std::str::FromStr;

use crate::error::ProtocolError;
use crate::user::User;

use super::types::Message;

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        let line = s.trim();
        if line.is_empty() {
            return Err(ProtocolError::EmptyMessage);
        }

        let (user, body) = if let Some(prefixed) = line.strip_prefix(':') {
            let (prefix, body) = prefixed
                .split_once(' ')
                .ok_or_else(|| ProtocolError::MalformedPrefix(line.to_string()))?;
            (User::parse(prefix), body)
        } else {
            (User::default(), line)
        };

        let (left, trailing) = match body.split_once(" :") {
            Some((left, trailing)) => (left, trailing),
            None => (body, ""),
        };

        let mut words = left.split_whitespace();
        let command = words
            .next()
            .ok_or_else(|| ProtocolError::MissingCommand(line.to_string()))?;
        let args = words.map(str::to_string).collect();

        Ok(Message {
            user,
            command: command.to_string(),
            args,
            trailing: trailing.to_string(),
        })
    }
}
