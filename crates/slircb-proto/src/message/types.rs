use crate::user::User;

/// A parsed IRC message.
///
/// `command` is either an upper-case verb such as `PRIVMSG` or a
/// three-digit numeric reply code. `args` holds the middle parameters;
/// `trailing` is the final parameter introduced by `:` on the wire and may
/// contain spaces (or be empty). Invariants: `command` is non-empty and
/// every element of `args` is non-empty and contains no space.
///
/// # Example
///
/// ```
/// use slircb_proto::Message;
///
/// let msg: Message = ":irc.example 353 bot = #chan :@alice +bob\r\n".parse().unwrap();
/// assert_eq!(msg.command, "353");
/// assert_eq!(msg.args, vec!["bot", "=", "#chan"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message origin; all-empty for outbound and prefix-less lines.
    pub user: User,
    /// The IRC verb or numeric reply code.
    pub command: String,
    /// Middle parameters, in wire order.
    pub args: Vec<String>,
    /// Trailing parameter; may be empty, may contain spaces.
    pub trailing: String,
}

impl Message {
    /// Create a message from raw components.
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        trailing: impl Into<String>,
    ) -> Self {
        Message {
            user: User::default(),
            command: command.into(),
            args,
            trailing: trailing.into(),
        }
    }

    /// Create a PRIVMSG to a channel or nick.
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Self {
        Message::new("PRIVMSG", vec![target.into()], text)
    }

    /// Create a NOTICE to a channel or nick.
    pub fn notice(target: impl Into<String>, text: impl Into<String>) -> Self {
        Message::new("NOTICE", vec![target.into()], text)
    }

    /// Create a JOIN for a channel.
    pub fn join(channel: impl Into<String>) -> Self {
        Message::new("JOIN", vec![channel.into()], "")
    }

    /// Create a PART for a channel.
    pub fn part(channel: impl Into<String>) -> Self {
        Message::new("PART", vec![channel.into()], "")
    }

    /// Create a NICK change request.
    pub fn nick(nickname: impl Into<String>) -> Self {
        Message::new("NICK", vec![nickname.into()], "")
    }

    /// Create the USER registration message sent during the handshake.
    pub fn user_register(name: &str) -> Self {
        Message::new(
            "USER",
            vec![name.to_string(), "8".to_string(), "*".to_string()],
            name,
        )
    }

    /// Create a PASS message.
    pub fn pass(password: impl Into<String>) -> Self {
        Message::new("PASS", vec![password.into()], "")
    }

    /// Create a PONG echoing a PING's args and trailing.
    pub fn pong(args: Vec<String>, trailing: impl Into<String>) -> Self {
        Message::new("PONG", args, trailing)
    }

    /// Create a QUIT with an optional parting message.
    pub fn quit(reason: Option<&str>) -> Self {
        Message::new("QUIT", Vec::new(), reason.unwrap_or(""))
    }

    /// Create a MODE change, e.g. `mode("#chan", "+o", Some("nick"))`.
    pub fn mode(target: impl Into<String>, modes: impl Into<String>, arg: Option<&str>) -> Self {
        let mut args = vec![target.into(), modes.into()];
        if let Some(a) = arg {
            args.push(a.to_string());
        }
        Message::new("MODE", args, "")
    }

    /// Create a KICK with an optional reason.
    pub fn kick(
        channel: impl Into<String>,
        nickname: impl Into<String>,
        reason: Option<&str>,
    ) -> Self {
        Message::new(
            "KICK",
            vec![channel.into(), nickname.into()],
            reason.unwrap_or(""),
        )
    }

    /// Create a WHOIS query.
    pub fn whois(nickname: impl Into<String>) -> Self {
        Message::new("WHOIS", vec![nickname.into()], "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privmsg_constructor() {
        let msg = Message::privmsg("#chan", "hello");
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.args, vec!["#chan"]);
        assert_eq!(msg.trailing, "hello");
        assert!(msg.user.is_empty());
    }

    #[test]
    fn user_register_shape() {
        let msg = Message::user_register("bot");
        assert_eq!(msg.args, vec!["bot", "8", "*"]);
        assert_eq!(msg.trailing, "bot");
    }

    #[test]
    fn mode_with_and_without_arg() {
        let m = Message::mode("#chan", "+o", Some("alice"));
        assert_eq!(m.args, vec!["#chan", "+o", "alice"]);
        let m = Message::mode("#chan", "+m", None);
        assert_eq!(m.args, vec!["#chan", "+m"]);
    }

    #[test]
    fn kick_with_reason() {
        let m = Message::kick("#chan", "bad", Some("spam"));
        assert_eq!(m.args, vec!["#chan", "bad"]);
        assert_eq!(m.trailing, "spam");
    }
}
