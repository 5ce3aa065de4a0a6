//! Per-invocation handler context.
//!
//! Every handler body receives a [`Context`]: the matched message, its
//! captures, and handles to the rest of the bot. Reply primitives resolve
//! their recipient from the message in scope.

use std::sync::Arc;
use std::time::Duration;

use slircb_proto::Message;
use tracing::warn;

use crate::bot::Core;
use crate::broker::Predicate;
use crate::config::BotConfig;
use crate::engine::pattern::{self, Captures, Template, DEFAULT_MATCH_GROUP};
use crate::error::SendError;
use crate::network::ConnHandle;
use crate::state::{ChannelHandle, Roster};

/// Resolve the channel-or-nick a message originated from.
///
/// For PRIVMSG: the first argument, unless it names the bot itself, in
/// which case the sender's nick. For JOIN: the trailing (the channel).
/// Anything else falls back to the sender's nick.
pub(crate) fn origin(message: &Message, bot_nick: &str) -> Option<String> {
    match message.command.as_str() {
        "PRIVMSG" => {
            let target = message.args.first()?;
            if target == bot_nick {
                let nick = &message.user.nick;
                (!nick.is_empty()).then(|| nick.clone())
            } else {
                Some(target.clone())
            }
        }
        "JOIN" => (!message.trailing.is_empty()).then(|| message.trailing.clone()),
        _ => {
            let nick = &message.user.nick;
            (!nick.is_empty()).then(|| nick.clone())
        }
    }
}

/// Context handed to every handler body.
#[derive(Clone)]
pub struct Context {
    /// The matched message.
    pub message: Arc<Message>,
    /// Captures extracted by the matching pattern.
    pub captures: Captures,
    /// Name of the unit the handler belongs to.
    pub unit: String,
    pub(crate) core: Arc<Core>,
}

impl Context {
    pub(crate) fn new(
        core: Arc<Core>,
        message: Arc<Message>,
        captures: Captures,
        unit: String,
    ) -> Self {
        Context {
            message,
            captures,
            unit,
            core,
        }
    }

    /// The bot configuration.
    pub fn config(&self) -> &BotConfig {
        &self.core.config
    }

    /// The channel-actor table.
    pub fn roster(&self) -> &Roster {
        &self.core.roster
    }

    /// The outbound connection handle.
    pub fn sender(&self) -> ConnHandle {
        self.core.conn.clone()
    }

    /// The bot's current nick (the configured one, possibly suffixed with
    /// `_` after nick-in-use retries).
    pub async fn current_nick(&self) -> String {
        self.core.nick.read().await.clone()
    }

    /// The actor handle for the channel this message originated on, if any.
    pub async fn channel(&self) -> Option<ChannelHandle> {
        let nick = self.core.nick.read().await;
        let target = origin(&self.message, &nick)?;
        self.core.roster.get(&target)
    }

    /// Send a raw message over the connection. Returns once the write
    /// completed.
    pub async fn send(&self, message: Message) -> Result<(), SendError> {
        self.core.conn.send(message).await
    }

    /// PRIVMSG the originating channel, or the originating nick for a
    /// private message.
    pub async fn reply(&self, text: &str) -> Result<(), SendError> {
        self.reply_as("PRIVMSG", false, text).await
    }

    /// PRIVMSG the originating nick directly, regardless of addressing.
    pub async fn reply_priv(&self, text: &str) -> Result<(), SendError> {
        self.reply_as("PRIVMSG", true, text).await
    }

    /// NOTICE the originating channel, or the originating nick for a
    /// private message.
    pub async fn reply_notice(&self, text: &str) -> Result<(), SendError> {
        self.reply_as("NOTICE", false, text).await
    }

    /// NOTICE the originating nick directly.
    pub async fn reply_priv_notice(&self, text: &str) -> Result<(), SendError> {
        self.reply_as("NOTICE", true, text).await
    }

    async fn reply_as(&self, command: &str, private: bool, text: &str) -> Result<(), SendError> {
        let target = if private {
            let nick = &self.message.user.nick;
            (!nick.is_empty()).then(|| nick.clone())
        } else {
            let nick = self.core.nick.read().await;
            origin(&self.message, &nick)
        };

        let Some(target) = target else {
            warn!(unit = %self.unit, command = %self.message.command, "no reply target");
            return Ok(());
        };
        self.core
            .conn
            .send(Message::new(command, vec![target], text))
            .await
    }

    /// Begin awaiting a future message matching `pattern`.
    ///
    /// The returned builder selects channel/nick filters and the timeout
    /// (default 60 s, any channel, any nick); `.wait()` suspends this
    /// handler until a matching PRIVMSG arrives or the timeout expires.
    pub fn resp(&self, pattern: &str) -> AwaitResp<'_> {
        AwaitResp {
            ctx: self,
            pattern: pattern.to_string(),
            chan: None,
            nick: None,
            timeout: Duration::from_secs(60),
            match_group: DEFAULT_MATCH_GROUP.to_string(),
        }
    }
}

/// Builder for a suspended one-shot callback. See [`Context::resp`].
pub struct AwaitResp<'a> {
    ctx: &'a Context,
    pattern: String,
    chan: Option<String>,
    nick: Option<String>,
    timeout: Duration,
    match_group: String,
}

impl AwaitResp<'_> {
    /// Only accept messages on this channel.
    pub fn chan(mut self, chan: &str) -> Self {
        self.chan = Some(chan.to_string());
        self
    }

    /// Only accept messages from this nick.
    pub fn nick(mut self, nick: &str) -> Self {
        self.nick = Some(nick.to_string());
        self
    }

    /// Give up after this long (default 60 s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Capture class for untyped `:name` placeholders in the pattern.
    pub fn match_group(mut self, class: &str) -> Self {
        self.match_group = class.to_string();
        self
    }

    /// Suspend until a matching message arrives. Resolves to `None` when
    /// the timeout expires (the pending callback is removed).
    pub async fn wait(self) -> Option<(Arc<Message>, Captures)> {
        let Some(predicate) = build_predicate(
            &self.pattern,
            self.chan,
            self.nick,
            &self.match_group,
        ) else {
            return None;
        };
        self.ctx.core.broker.wait(predicate, self.timeout).await
    }
}

fn build_predicate(
    pattern: &str,
    chan: Option<String>,
    nick: Option<String>,
    match_group: &str,
) -> Option<Predicate> {
    let filters_pass = move |message: &Message| -> bool {
        if let Some(ref c) = chan {
            if message.args.len() != 1 || message.args[0] != *c {
                return false;
            }
        }
        if let Some(ref n) = nick {
            if message.user.nick != *n {
                return false;
            }
        }
        true
    };

    if pattern::has_placeholders(pattern) {
        let template = match Template::compile(pattern, match_group) {
            Ok(t) => t,
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "bad await pattern");
                return None;
            }
        };
        Some(Box::new(move |message: &Message| {
            if !filters_pass(message) {
                return None;
            }
            template.captures(&message.trailing)
        }))
    } else {
        let literal = pattern.to_string();
        Some(Box::new(move |message: &Message| {
            if !filters_pass(message) {
                return None;
            }
            (message.trailing == literal).then(Captures::new)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slircb_proto::User;

    fn privmsg_from(nick: &str, target: &str, text: &str) -> Message {
        let mut m = Message::privmsg(target, text);
        m.user = User::new(nick, "user", "host");
        m
    }

    #[test]
    fn origin_resolves_channel_and_nick() {
        let m = privmsg_from("alice", "#chan", "hi");
        assert_eq!(origin(&m, "bot").as_deref(), Some("#chan"));

        let m = privmsg_from("alice", "bot", "hi");
        assert_eq!(origin(&m, "bot").as_deref(), Some("alice"));

        let mut m = Message::new("JOIN", Vec::new(), "#joined");
        m.user = User::new("alice", "user", "host");
        assert_eq!(origin(&m, "bot").as_deref(), Some("#joined"));
    }

    #[test]
    fn predicate_literal_with_filters() {
        let p = build_predicate(
            "go",
            Some("#c".to_string()),
            Some("alice".to_string()),
            DEFAULT_MATCH_GROUP,
        )
        .unwrap();

        assert!(p(&privmsg_from("alice", "#c", "go")).is_some());
        assert!(p(&privmsg_from("alice", "#c", "stop")).is_none());
        assert!(p(&privmsg_from("bob", "#c", "go")).is_none());
        assert!(p(&privmsg_from("alice", "#other", "go")).is_none());
    }

    #[test]
    fn predicate_template_extracts_captures() {
        let p = build_predicate("pick :n", None, None, "[0-9]+").unwrap();

        let caps = p(&privmsg_from("bob", "#c", "pick 7")).unwrap();
        assert_eq!(caps["n"], "7");
        assert!(p(&privmsg_from("bob", "#c", "pick seven")).is_none());
    }
}
