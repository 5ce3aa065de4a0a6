//! Per-channel state actor.
//!
//! Each joined channel gets one actor task owning that channel's members
//! and rolling message buffer. All interactions happen via [`ChannelEvent`]
//! messages, so per-channel mutations are serialized without locks on the
//! dispatch path.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use slircb_proto::Message;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::channel::ChannelMember;

/// Depth of the per-channel rolling PRIVMSG buffer.
pub const BUFFER_CAPACITY: usize = 10_000;

/// Events a channel actor processes sequentially.
pub enum ChannelEvent {
    /// Upsert a member from a possibly sigil-prefixed nick.
    SetUser {
        /// Nick as it appears on the wire, sigil included.
        nick: String,
    },
    /// Look up a member.
    GetUser {
        /// Nick to look up (no sigil).
        nick: String,
        /// Reply channel for the result.
        reply_tx: oneshot::Sender<Option<ChannelMember>>,
    },
    /// Remove a member if present.
    DelUser {
        /// Nick to remove.
        nick: String,
    },
    /// Rename a member if present; no-op otherwise.
    RenameUser {
        /// Current nick.
        old: String,
        /// New nick.
        new: String,
    },
    /// Prepend a message to the rolling buffer.
    LogMessage {
        /// The message to record.
        message: Arc<Message>,
    },
    /// Run a closure over a snapshot of the buffer (newest first).
    WithBuffer {
        /// Closure applied on the actor task; replies through its own
        /// captured channel.
        f: Box<dyn FnOnce(&VecDeque<Arc<Message>>) + Send>,
    },
    /// Count current members.
    MemberCount {
        /// Reply channel for the result.
        reply_tx: oneshot::Sender<usize>,
    },
}

/// The channel actor: owns one channel's state and processes events in
/// arrival order.
pub struct ChannelActor {
    name: String,
    members: HashMap<String, ChannelMember>,
    buffer: VecDeque<Arc<Message>>,
}

impl ChannelActor {
    /// Create an actor for `name` and spawn its task.
    pub fn spawn(name: String) -> (mpsc::Sender<ChannelEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(100);

        let actor = Self {
            name,
            members: HashMap::new(),
            buffer: VecDeque::new(),
        };

        let join = tokio::spawn(actor.run(rx));
        (tx, join)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<ChannelEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle_event(event);
        }
        debug!(channel = %self.name, "channel actor stopped");
    }

    fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::SetUser { nick } => {
                let member = ChannelMember::from_sigiled(&nick);
                self.members.insert(member.nick.clone(), member);
            }
            ChannelEvent::GetUser { nick, reply_tx } => {
                let _ = reply_tx.send(self.members.get(&nick).cloned());
            }
            ChannelEvent::DelUser { nick } => {
                self.members.remove(&nick);
            }
            ChannelEvent::RenameUser { old, new } => {
                if let Some(mut member) = self.members.remove(&old) {
                    member.nick = new.clone();
                    self.members.insert(new, member);
                }
            }
            ChannelEvent::LogMessage { message } => {
                self.buffer.push_front(message);
                if self.buffer.len() > BUFFER_CAPACITY {
                    self.buffer.pop_back();
                }
            }
            ChannelEvent::WithBuffer { f } => {
                f(&self.buffer);
            }
            ChannelEvent::MemberCount { reply_tx } => {
                let _ = reply_tx.send(self.members.len());
            }
        }
    }
}
