//! Message origin, parsed from the `:prefix` of an inbound line.

use std::fmt::{self, Display, Formatter};

/// The origin of an IRC message.
///
/// For a full user prefix `nick!name@rdns` all three fields are set. For a
/// bare server prefix (no `!`) only `nick` carries the server name. A
/// message we constructed ourselves, or an inbound line without a prefix,
/// has all fields empty. Empty strings are meaningful: they are what
/// distinguishes a server-origin message from a user-origin one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct User {
    /// Nickname, or server name for a bare prefix.
    pub nick: String,
    /// Username (ident).
    pub name: String,
    /// Reverse-DNS hostname.
    pub rdns: String,
}

impl User {
    /// Create a user from explicit components.
    pub fn new(
        nick: impl Into<String>,
        name: impl Into<String>,
        rdns: impl Into<String>,
    ) -> Self {
        User {
            nick: nick.into(),
            name: name.into(),
            rdns: rdns.into(),
        }
    }

    /// Parse a prefix string (without the leading `:`).
    ///
    /// Splits once on `!`; a single token is a server or bare-nick prefix,
    /// two tokens are `nick` plus `name@rdns` which is split once on `@`.
    pub fn parse(prefix: &str) -> Self {
        match prefix.split_once('!') {
            None => User {
                nick: prefix.to_string(),
                ..User::default()
            },
            Some((nick, rest)) => {
                let (name, rdns) = rest.split_once('@').unwrap_or((rest, ""));
                User {
                    nick: nick.to_string(),
                    name: name.to_string(),
                    rdns: rdns.to_string(),
                }
            }
        }
    }

    /// Whether this origin carries no information at all.
    pub fn is_empty(&self) -> bool {
        self.nick.is_empty() && self.name.is_empty() && self.rdns.is_empty()
    }

    /// Whether this looks like a server-origin prefix (nick only).
    pub fn is_server(&self) -> bool {
        !self.nick.is_empty() && self.name.is_empty() && self.rdns.is_empty()
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() && self.rdns.is_empty() {
            write!(f, "{}", self.nick)
        } else {
            write!(f, "{}!{}@{}", self.nick, self.name, self.rdns)
        }
    }
}
