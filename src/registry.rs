//! Module registry: the live set of handler units and the broadcast path.
//!
//! Each loaded unit runs as its own task fed by a bounded mpsc channel, so
//! delivery to a single unit is FIFO with respect to socket arrival order
//! while units process independently of each other. Unloading a unit
//! closes its inbox but keeps the unit resident for a later reload.

use std::sync::Arc;

use dashmap::DashMap;
use futures_util::FutureExt;
use slircb_proto::Message;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::bot::Core;
use crate::engine::help;
use crate::engine::unit::HandlerUnit;
use crate::error::EngineError;

struct ModuleSlot {
    unit: Arc<HandlerUnit>,
    inbox: Option<mpsc::Sender<Arc<Message>>>,
}

/// The process-wide unit table. The registry is the single writer.
#[derive(Default)]
pub struct Registry {
    modules: DashMap<String, ModuleSlot>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Add a unit to the broadcast set, synthesizing its help surface if a
    /// help command is configured. Replaces any resident unit of the same
    /// name.
    pub fn register(&self, core: &Arc<Core>, mut unit: HandlerUnit) -> Result<(), EngineError> {
        if let Some(help_cmd) = &core.config.help_cmd {
            let extra = help::synthesize(&unit, help_cmd)?;
            unit.specs.extend(extra);
        }

        let name = unit.name.clone();
        let unit = Arc::new(unit);
        let inbox = spawn_unit_task(Arc::clone(core), Arc::clone(&unit));
        self.modules.insert(
            name.clone(),
            ModuleSlot {
                unit,
                inbox: Some(inbox),
            },
        );
        debug!(unit = %name, "unit registered");
        Ok(())
    }

    /// Remove a unit from the broadcast set. The unit stays resident and
    /// can be re-registered later with [`Registry::reload`].
    pub fn unregister(&self, name: &str) {
        if let Some(mut slot) = self.modules.get_mut(name) {
            slot.inbox = None;
            debug!(unit = %name, "unit unregistered");
        }
    }

    /// Re-register a resident unit (unload + load).
    pub fn reload(&self, core: &Arc<Core>, name: &str) {
        if let Some(mut slot) = self.modules.get_mut(name) {
            slot.inbox = None;
            let inbox = spawn_unit_task(Arc::clone(core), Arc::clone(&slot.unit));
            slot.inbox = Some(inbox);
            debug!(unit = %name, "unit reloaded");
        }
    }

    /// Names of all resident units, loaded or not.
    pub fn names(&self) -> Vec<String> {
        self.modules.iter().map(|e| e.key().clone()).collect()
    }

    /// Whether a unit is currently in the broadcast set.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.modules
            .get(name)
            .map(|s| s.inbox.is_some())
            .unwrap_or(false)
    }

    /// Deliver one message to every loaded unit.
    pub async fn broadcast(&self, message: Arc<Message>) {
        // Collect senders first so no shard lock is held across an await.
        let inboxes: Vec<(String, mpsc::Sender<Arc<Message>>)> = self
            .modules
            .iter()
            .filter_map(|e| e.value().inbox.clone().map(|tx| (e.key().clone(), tx)))
            .collect();

        for (name, inbox) in inboxes {
            if inbox.send(Arc::clone(&message)).await.is_err() {
                warn!(unit = %name, "unit inbox closed, dropping message");
            }
        }
    }
}

/// Spawn a unit's dispatch task. The loop is supervised: a panic that
/// escapes the engine is logged and the loop resumes with the same inbox.
fn spawn_unit_task(core: Arc<Core>, unit: Arc<HandlerUnit>) -> mpsc::Sender<Arc<Message>> {
    let (tx, mut rx) = mpsc::channel::<Arc<Message>>(256);

    tokio::spawn(async move {
        loop {
            let run = unit_loop(&core, &unit, &mut rx);
            match std::panic::AssertUnwindSafe(run).catch_unwind().await {
                Ok(()) => break,
                Err(_) => {
                    error!(unit = %unit.name, "unit task crashed, restarting");
                }
            }
        }
        debug!(unit = %unit.name, "unit task stopped");
    });

    tx
}

async fn unit_loop(
    core: &Arc<Core>,
    unit: &Arc<HandlerUnit>,
    rx: &mut mpsc::Receiver<Arc<Message>>,
) {
    while let Some(message) = rx.recv().await {
        unit.dispatch(core, &message).await;
    }
}
