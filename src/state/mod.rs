//! Per-channel state: membership, modes, and the rolling message buffer.
//!
//! The [`Roster`] is the process-wide channel-name → actor table; it is the
//! single writer of that table. Each [`ChannelHandle`] talks to one
//! [`actor::ChannelActor`] task, which serializes all mutations for its
//! channel.

pub mod actor;
pub mod channel;

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use slircb_proto::Message;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

pub use actor::BUFFER_CAPACITY;
pub use channel::{ChannelMember, MemberMode};

use actor::{ChannelActor, ChannelEvent};

/// Handle to one channel's actor.
#[derive(Clone)]
pub struct ChannelHandle {
    /// Channel name.
    pub name: String,
    tx: mpsc::Sender<ChannelEvent>,
}

impl ChannelHandle {
    /// Upsert a member from a possibly sigil-prefixed nick.
    pub async fn set_user(&self, nick: &str) {
        let _ = self
            .tx
            .send(ChannelEvent::SetUser {
                nick: nick.to_string(),
            })
            .await;
    }

    /// Look up a member by nick.
    pub async fn get_user(&self, nick: &str) -> Option<ChannelMember> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ChannelEvent::GetUser {
                nick: nick.to_string(),
                reply_tx,
            })
            .await
            .ok()?;
        reply_rx.await.ok().flatten()
    }

    /// Remove a member if present.
    pub async fn del_user(&self, nick: &str) {
        let _ = self
            .tx
            .send(ChannelEvent::DelUser {
                nick: nick.to_string(),
            })
            .await;
    }

    /// Rename a member if present.
    pub async fn rename_user(&self, old: &str, new: &str) {
        let _ = self
            .tx
            .send(ChannelEvent::RenameUser {
                old: old.to_string(),
                new: new.to_string(),
            })
            .await;
    }

    /// Record a message in the channel's rolling buffer.
    pub async fn log_message(&self, message: Arc<Message>) {
        let _ = self.tx.send(ChannelEvent::LogMessage { message }).await;
    }

    /// Apply `f` to a snapshot of the buffer (newest first) and return its
    /// result. Returns `None` if the actor is gone.
    pub async fn with_buffer<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&VecDeque<Arc<Message>>) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ChannelEvent::WithBuffer {
                f: Box::new(move |buf| {
                    let _ = reply_tx.send(f(buf));
                }),
            })
            .await
            .ok()?;
        reply_rx.await.ok()
    }

    /// Count current members.
    pub async fn member_count(&self) -> usize {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .tx
            .send(ChannelEvent::MemberCount { reply_tx })
            .await
            .is_err()
        {
            return 0;
        }
        reply_rx.await.unwrap_or(0)
    }
}

/// Process-wide channel-name → actor table.
///
/// Channels are created on first JOIN and live until the process exits;
/// PART does not destroy them unless [`Roster::remove`] is called
/// explicitly. Actors that crash are restarted with fresh state (transient
/// restart), and the table survives reconnection.
#[derive(Clone, Default)]
pub struct Roster {
    channels: Arc<DashMap<String, ChannelHandle>>,
}

impl Roster {
    /// Get the handle for `name`, starting an actor if none exists.
    pub fn ensure(&self, name: &str) -> ChannelHandle {
        match self.channels.entry(name.to_string()) {
            Entry::Occupied(e) => e.get().clone(),
            Entry::Vacant(e) => {
                let handle = self.start_actor(name);
                e.insert(handle.clone());
                handle
            }
        }
    }

    /// Get the handle for `name` if an actor exists.
    pub fn get(&self, name: &str) -> Option<ChannelHandle> {
        self.channels.get(name).map(|h| h.clone())
    }

    /// Explicitly remove a channel and let its actor wind down.
    pub fn remove(&self, name: &str) {
        self.channels.remove(name);
    }

    /// Names of all known channels.
    pub fn names(&self) -> Vec<String> {
        self.channels.iter().map(|e| e.key().clone()).collect()
    }

    fn start_actor(&self, name: &str) -> ChannelHandle {
        let (tx, join) = ChannelActor::spawn(name.to_string());
        let handle = ChannelHandle {
            name: name.to_string(),
            tx,
        };

        // Transient restart: replace the actor (fresh state) only on
        // abnormal exit, and only while the channel is still known.
        let roster = self.clone();
        let chan = name.to_string();
        tokio::spawn(async move {
            if let Err(e) = join.await {
                if e.is_panic() {
                    warn!(channel = %chan, "channel actor crashed, restarting");
                    if roster.channels.contains_key(&chan) {
                        let handle = roster.start_actor(&chan);
                        roster.channels.insert(chan, handle);
                    }
                }
            }
        });

        handle
    }
}
