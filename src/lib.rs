//! # slircb
//!
//! A declarative IRC bot framework. Handler units declare which server
//! commands they react to, which patterns within those commands they
//! match, and what to do on match; the framework connects to the server,
//! parses every inbound line, fans it out across all loaded units, and
//! routes replies back over the connection.
//!
//! The moving parts:
//!
//! - the wire codec ([`slircb_proto`], re-exported here)
//! - the connection manager ([`network`]): one socket, plain or TLS,
//!   with reconnect and a server-liveness timeout
//! - the match engine ([`engine`]): per-command, per-pattern match tables
//!   with validator scopes, aliases, and uniqueness policies
//! - the module registry ([`registry`]): the live unit set and broadcast
//! - the callback broker ([`broker`]): one-shot predicates that let an
//!   in-flight handler await a future message
//! - channel actors ([`state`]): per-channel membership, modes, and a
//!   rolling message buffer
//! - the built-in protocol handler: PING, welcome joins, NAMES, nick-in-use
//!   retry, and membership bookkeeping
//!
//! ## Example
//!
//! ```no_run
//! use slircb::{Bot, BotConfig, UnitBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = BotConfig::new("irc.example.net", 6667, "examplebot");
//!     config.channels = vec!["#example".to_string()];
//!
//!     let mut unit = UnitBuilder::new("greeter");
//!     unit.command("PRIVMSG", |c| {
//!         c.handle("!hello :who", |ctx| async move {
//!             let who = ctx.captures["who"].clone();
//!             ctx.reply(&format!("hello, {who}")).await?;
//!             Ok(())
//!         })
//!         .doc("greet somebody");
//!     });
//!
//!     let mut bot = Bot::new(config)?;
//!     bot.register(unit.build()?);
//!     let handle = bot.spawn()?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown();
//!     Ok(())
//! }
//! ```

#![deny(clippy::all)]

pub mod bot;
pub mod broker;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub(crate) mod handlers;
pub mod network;
pub mod registry;
pub mod state;

pub use bot::{Bot, BotHandle};
pub use config::{BotConfig, IpType};
pub use context::{AwaitResp, Context};
pub use engine::{
    Captures, HandlerUnit, MatchSpec, OverridePolicy, Pattern, UnitBuilder, Uniqueness, Validator,
};
pub use error::{ConfigError, EngineError, SendError};
pub use network::ConnHandle;
pub use slircb_proto::{Message, User};
pub use state::{ChannelHandle, ChannelMember, MemberMode, Roster};
