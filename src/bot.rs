//! Bot assembly and supervision.
//!
//! [`Bot`] wires the pieces together: validated configuration, the module
//! registry, the channel roster, the callback broker, and the connection
//! manager. The broker and connection manager run as supervised tasks; a
//! crash is logged and the task restarted.

use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::error;

use crate::broker::{Broker, BrokerHandle};
use crate::config::BotConfig;
use crate::engine::unit::HandlerUnit;
use crate::error::{ConfigError, EngineError};
use crate::handlers;
use crate::network::{ConnHandle, Link};
use crate::registry::Registry;
use crate::state::Roster;

/// Shared state reachable from every handler through its context.
pub struct Core {
    /// Validated configuration.
    pub(crate) config: BotConfig,
    /// Channel-name → actor table.
    pub(crate) roster: Roster,
    /// The live unit set.
    pub(crate) registry: Registry,
    /// Handle to the callback broker.
    pub(crate) broker: BrokerHandle,
    /// Handle to the connection manager's outbound path.
    pub(crate) conn: ConnHandle,
    /// The bot's current nick; starts as the configured name and picks up
    /// `_` suffixes through nick-in-use retries.
    pub(crate) nick: RwLock<String>,
}

/// A bot under construction: configuration plus the units to load.
pub struct Bot {
    config: BotConfig,
    units: Vec<HandlerUnit>,
}

impl Bot {
    /// Validate the configuration and begin assembly.
    pub fn new(config: BotConfig) -> Result<Bot, ConfigError> {
        config.validate()?;
        Ok(Bot {
            config,
            units: Vec::new(),
        })
    }

    /// Queue a handler unit for registration at spawn.
    pub fn register(&mut self, unit: HandlerUnit) -> &mut Self {
        self.units.push(unit);
        self
    }

    /// Start the bot: loads the built-in unit and all queued units, then
    /// spawns the broker and connection-manager tasks. Must be called
    /// from within a tokio runtime.
    pub fn spawn(self) -> Result<BotHandle, EngineError> {
        let (broker, broker_task) = Broker::spawn();
        let (conn, outbound_rx) = ConnHandle::pair();

        let core = Arc::new(Core {
            nick: RwLock::new(self.config.bot_name.clone()),
            config: self.config,
            roster: Roster::default(),
            registry: Registry::new(),
            broker,
            conn,
        });

        core.registry.register(&core, handlers::core::unit()?)?;
        for unit in self.units {
            core.registry.register(&core, unit)?;
        }

        let link_core = Arc::clone(&core);
        let link_task = tokio::spawn(async move {
            let mut link = Link::new(link_core, outbound_rx);
            loop {
                let run = link.run();
                match std::panic::AssertUnwindSafe(run).catch_unwind().await {
                    Ok(()) => break,
                    Err(_) => error!("connection manager crashed, restarting"),
                }
            }
        });

        Ok(BotHandle {
            core,
            link_task,
            broker_task,
        })
    }
}

/// Handle to a running bot.
pub struct BotHandle {
    core: Arc<Core>,
    link_task: JoinHandle<()>,
    broker_task: JoinHandle<()>,
}

impl BotHandle {
    /// Register a handler unit at runtime.
    pub fn register(&self, unit: HandlerUnit) -> Result<(), EngineError> {
        self.core.registry.register(&self.core, unit)
    }

    /// Remove a unit from the broadcast set; it stays resident.
    pub fn unregister(&self, name: &str) {
        self.core.registry.unregister(name);
    }

    /// Reload a resident unit (unload + load).
    pub fn reload(&self, name: &str) {
        self.core.registry.reload(&self.core, name);
    }

    /// Whether a unit is currently in the broadcast set.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.core.registry.is_loaded(name)
    }

    /// Handle for sending raw messages over the connection.
    pub fn sender(&self) -> ConnHandle {
        self.core.conn.clone()
    }

    /// The channel-actor table.
    pub fn roster(&self) -> &Roster {
        &self.core.roster
    }

    /// The bot's current nick.
    pub async fn current_nick(&self) -> String {
        self.core.nick.read().await.clone()
    }

    /// The configuration the bot is running with.
    pub fn config(&self) -> &BotConfig {
        &self.core.config
    }

    /// Stop the connection manager and broker.
    pub fn shutdown(&self) {
        self.link_task.abort();
        self.broker_task.abort();
    }
}
