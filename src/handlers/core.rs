//! The built-in protocol handler unit.
//!
//! Always loaded. Keeps the connection alive (PING/PONG, nick-in-use
//! retry), joins configured channels on welcome, maintains channel-actor
//! membership from NAMES/JOIN/PART/QUIT/NICK/MODE traffic, and feeds
//! every PRIVMSG to the callback broker and the channel buffer.

use slircb_proto::Message;
use tracing::debug;

use crate::engine::{HandlerUnit, UnitBuilder};
use crate::error::EngineError;

/// Sigil for the three member-mode grants the MODE handler understands.
/// Everything else in a MODE line is silently ignored.
fn grant_sigil(modes: &str) -> Option<char> {
    match modes {
        "+v" => Some('+'),
        "+h" => Some('%'),
        "+o" => Some('@'),
        _ => None,
    }
}

/// Build the built-in unit.
pub(crate) fn unit() -> Result<HandlerUnit, EngineError> {
    let mut b = UnitBuilder::new("core");

    b.command("PING", |c| {
        c.handle_all(|ctx| async move {
            let pong = Message::pong(ctx.message.args.clone(), ctx.message.trailing.clone());
            ctx.send(pong).await?;
            Ok(())
        })
        .named("pong");
    });

    b.command("001", |c| {
        c.handle_all(|ctx| async move {
            for channel in ctx.config().channels.clone() {
                ctx.roster().ensure(&channel);
                ctx.send(Message::join(&channel)).await?;
            }
            Ok(())
        })
        .named("welcome");
    });

    b.command("353", |c| {
        c.handle_all(|ctx| async move {
            if let Some(channel) = ctx.message.args.last() {
                let handle = ctx.roster().ensure(channel);
                for nick in ctx.message.trailing.split_whitespace() {
                    handle.set_user(nick).await;
                }
            }
            Ok(())
        })
        .named("names");
    });

    b.command("433", |c| {
        c.handle_all(|ctx| async move {
            if let Some(taken) = ctx.message.args.get(1) {
                let retry = format!("{taken}_");
                *ctx.core.nick.write().await = retry.clone();
                ctx.send(Message::nick(retry)).await?;
            }
            Ok(())
        })
        .named("nick_in_use");
    });

    b.command("JOIN", |c| {
        c.handle_all(|ctx| async move {
            let channel = &ctx.message.trailing;
            if !channel.is_empty() && !ctx.message.user.nick.is_empty() {
                let handle = ctx.roster().ensure(channel);
                handle.set_user(&ctx.message.user.nick).await;
            }
            Ok(())
        })
        .named("join");
    });

    b.command("PART", |c| {
        c.handle_all(|ctx| async move {
            if let Some(channel) = ctx.message.args.first() {
                if let Some(handle) = ctx.roster().get(channel) {
                    handle.del_user(&ctx.message.user.nick).await;
                }
            }
            Ok(())
        })
        .named("part");
    });

    b.command("QUIT", |c| {
        c.handle_all(|ctx| async move {
            let nick = &ctx.message.user.nick;
            if !nick.is_empty() {
                for channel in ctx.roster().names() {
                    if let Some(handle) = ctx.roster().get(&channel) {
                        handle.del_user(nick).await;
                    }
                }
            }
            Ok(())
        })
        .named("quit");
    });

    b.command("NICK", |c| {
        c.handle_all(|ctx| async move {
            let old = &ctx.message.user.nick;
            let new = &ctx.message.trailing;
            if !old.is_empty() && !new.is_empty() {
                for channel in ctx.roster().names() {
                    if let Some(handle) = ctx.roster().get(&channel) {
                        handle.rename_user(old, new).await;
                    }
                }
            }
            Ok(())
        })
        .named("nick_change");
    });

    b.command("MODE", |c| {
        c.handle_all(|ctx| async move {
            if let [channel, modes, nick] = &ctx.message.args[..] {
                if let Some(sigil) = grant_sigil(modes) {
                    if let Some(handle) = ctx.roster().get(channel) {
                        handle.set_user(&format!("{sigil}{nick}")).await;
                    }
                }
            }
            Ok(())
        })
        .named("mode");
    });

    b.command("PRIVMSG", |c| {
        c.handle_all(|ctx| async move {
            ctx.core.broker.deliver(ctx.message.clone()).await;
            if let Some(target) = ctx.message.args.first() {
                if let Some(handle) = ctx.roster().get(target) {
                    handle.log_message(ctx.message.clone()).await;
                }
            }
            Ok(())
        })
        .named("privmsg");
    });

    b.command("311", |c| {
        c.handle_all(|ctx| async move {
            debug!(args = ?ctx.message.args, "whois reply");
            Ok(())
        })
        .named("whois_reply");
    });

    b.command("401", |c| {
        c.handle_all(|ctx| async move {
            debug!(args = ?ctx.message.args, "no such nick");
            Ok(())
        })
        .named("no_such_nick");
    });

    b.build()
}
