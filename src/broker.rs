//! Callback broker: pending one-shot predicates from suspended handlers.
//!
//! An in-flight handler that wants to react to a future message registers
//! a predicate here and suspends. The built-in protocol handler feeds
//! every inbound PRIVMSG through [`BrokerHandle::deliver`]; the first
//! pending predicate that matches is removed and its requester resumed
//! with the message and captures. A requester that times out cancels its
//! own entry.

use std::sync::Arc;
use std::time::Duration;

use slircb_proto::Message;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::engine::pattern::Captures;

/// A pending-callback predicate: `Some(captures)` on match.
pub type Predicate = Box<dyn Fn(&Message) -> Option<Captures> + Send>;

enum BrokerEvent {
    Register {
        id: Uuid,
        predicate: Predicate,
        reply_tx: oneshot::Sender<(Arc<Message>, Captures)>,
    },
    Deliver(Arc<Message>),
    Cancel(Uuid),
}

struct PendingCallback {
    id: Uuid,
    predicate: Predicate,
    reply_tx: oneshot::Sender<(Arc<Message>, Captures)>,
}

/// Handle to the broker task.
#[derive(Clone)]
pub struct BrokerHandle {
    tx: mpsc::Sender<BrokerEvent>,
}

impl BrokerHandle {
    /// Register a predicate and suspend until it matches or `timeout`
    /// expires. On timeout the pending entry is removed and `None` is
    /// returned.
    pub(crate) async fn wait(
        &self,
        predicate: Predicate,
        timeout: Duration,
    ) -> Option<(Arc<Message>, Captures)> {
        let id = Uuid::new_v4();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(BrokerEvent::Register {
                id,
                predicate,
                reply_tx,
            })
            .await
            .ok()?;

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(payload)) => Some(payload),
            Ok(Err(_)) => None,
            Err(_) => {
                let _ = self.tx.send(BrokerEvent::Cancel(id)).await;
                None
            }
        }
    }

    /// Offer a message to the pending callbacks, in registration order.
    pub(crate) async fn deliver(&self, message: Arc<Message>) {
        let _ = self.tx.send(BrokerEvent::Deliver(message)).await;
    }
}

/// The broker task.
pub struct Broker {
    pending: Vec<PendingCallback>,
}

impl Broker {
    /// Spawn the broker and return its handle.
    pub fn spawn() -> (BrokerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(100);
        let broker = Broker {
            pending: Vec::new(),
        };
        let join = tokio::spawn(broker.run(rx));
        (BrokerHandle { tx }, join)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<BrokerEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                BrokerEvent::Register {
                    id,
                    predicate,
                    reply_tx,
                } => {
                    self.pending.push(PendingCallback {
                        id,
                        predicate,
                        reply_tx,
                    });
                }
                BrokerEvent::Deliver(message) => {
                    self.deliver(message);
                }
                BrokerEvent::Cancel(id) => {
                    self.pending.retain(|p| p.id != id);
                }
            }
        }
        debug!("callback broker stopped");
    }

    fn deliver(&mut self, message: Arc<Message>) {
        for i in 0..self.pending.len() {
            if let Some(captures) = (self.pending[i].predicate)(&message) {
                let pending = self.pending.remove(i);
                let _ = pending.reply_tx.send((message, captures));
                return;
            }
        }
    }
}
