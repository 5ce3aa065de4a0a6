//! The connection manager.
//!
//! One task owns one socket. The run loop walks the lifecycle:
//! disconnected → connecting → registering → online, falling back to
//! disconnected on EOF, socket error, or liveness timeout, with a fixed
//! backoff between attempts. Module and channel-actor state live outside
//! this task and survive reconnection; after each re-handshake the
//! manager re-issues JOIN for every known channel actor.
//!
//! While online, a single select loop multiplexes three concerns: inbound
//! frames (parsed and broadcast in arrival order), outbound sends (written
//! and acknowledged so callers observe write completion), and the
//! liveness deadline. At most one broadcast is in flight at a time, which
//! preserves inbound ordering while keeping the outbound path free —
//! a handler blocked on its own send can never wedge the loop.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use slircb_proto::{enable_keepalive, BotStream, LineCodec, Message};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use super::{tls, LinkError};
use crate::bot::Core;
use crate::config::{BotConfig, IpType};
use crate::error::SendError;

pub(crate) struct Outbound {
    message: Message,
    ack: oneshot::Sender<()>,
}

/// Cloneable handle for sending messages over the connection.
///
/// [`ConnHandle::send`] returns only after the bytes were written, so
/// outbound traffic is totally ordered and callers feel back-pressure.
#[derive(Clone)]
pub struct ConnHandle {
    tx: mpsc::Sender<Outbound>,
}

impl ConnHandle {
    pub(crate) fn pair() -> (ConnHandle, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(64);
        (ConnHandle { tx }, rx)
    }

    /// Serialize and write a message, returning once the write completed.
    pub async fn send(&self, message: Message) -> Result<(), SendError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Outbound {
                message,
                ack: ack_tx,
            })
            .await
            .map_err(|_| SendError)?;
        ack_rx.await.map_err(|_| SendError)
    }
}

enum Exit {
    /// All handles dropped; wind down for good.
    Shutdown,
    /// Socket died one way or another; reconnect.
    ConnectionLost,
}

/// The connection manager task body.
pub struct Link {
    core: Arc<Core>,
    outbound: mpsc::Receiver<Outbound>,
}

impl Link {
    pub(crate) fn new(core: Arc<Core>, outbound: mpsc::Receiver<Outbound>) -> Self {
        Link { core, outbound }
    }

    /// Run until shutdown, reconnecting forever.
    pub async fn run(&mut self) {
        let retry = Duration::from_millis(self.core.config.reconnect_interval);
        let mut first_attempt = true;

        loop {
            if !first_attempt {
                tokio::time::sleep(retry).await;
            }
            first_attempt = false;

            let stream = match connect(&self.core.config).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(server = %self.core.config.server, error = %e, "connect failed");
                    continue;
                }
            };
            let mut framed = Framed::new(stream, LineCodec::new());

            // Registering: each (re)connect starts over from the
            // configured nick; the 433 path appends suffixes as needed.
            *self.core.nick.write().await = self.core.config.bot_name.clone();
            if let Err(e) = handshake(&mut framed, &self.core.config).await {
                warn!(error = %e, "handshake failed");
                continue;
            }

            // Known channel actors predate this connection; rejoin them.
            for channel in self.core.roster.names() {
                if let Err(e) = framed.send(Message::join(channel)).await {
                    warn!(error = %e, "rejoin failed");
                }
            }

            info!(
                server = %self.core.config.server,
                port = self.core.config.port,
                "connected"
            );

            match self.online(&mut framed).await {
                Exit::Shutdown => return,
                Exit::ConnectionLost => {
                    warn!(server = %self.core.config.server, "connection lost, reconnecting");
                }
            }
        }
    }

    /// The online state: dispatch inbound, drain outbound, watch liveness.
    async fn online(&mut self, framed: &mut Framed<BotStream, LineCodec>) -> Exit {
        let timeout = self.core.config.server_timeout.map(Duration::from_millis);
        let liveness = tokio::time::sleep(timeout.unwrap_or_default());
        tokio::pin!(liveness);
        if let Some(t) = timeout {
            liveness.as_mut().reset(Instant::now() + t);
        }

        let mut broadcast: Option<BoxFuture<'static, ()>> = None;

        loop {
            tokio::select! {
                frame = framed.next(), if broadcast.is_none() => {
                    match frame {
                        Some(Ok(line)) => {
                            if let Some(t) = timeout {
                                liveness.as_mut().reset(Instant::now() + t);
                            }
                            let line = line.trim();
                            if line.is_empty() {
                                continue;
                            }
                            match line.parse::<Message>() {
                                Ok(message) => {
                                    debug!(raw = %line, "received");
                                    let core = Arc::clone(&self.core);
                                    let message = Arc::new(message);
                                    broadcast = Some(Box::pin(async move {
                                        core.registry.broadcast(message).await;
                                    }));
                                }
                                Err(e) => {
                                    warn!(line = %line, error = %e, "dropping unparseable line");
                                }
                            }
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "read error");
                            return Exit::ConnectionLost;
                        }
                        None => {
                            info!("server closed connection");
                            return Exit::ConnectionLost;
                        }
                    }
                }
                () = async { broadcast.as_mut().expect("in-flight broadcast").await },
                    if broadcast.is_some() =>
                {
                    broadcast = None;
                }
                out = self.outbound.recv() => {
                    match out {
                        Some(Outbound { message, ack }) => {
                            if let Err(e) = framed.send(message).await {
                                warn!(error = %e, "write error");
                                return Exit::ConnectionLost;
                            }
                            let _ = ack.send(());
                        }
                        None => return Exit::Shutdown,
                    }
                }
                () = liveness.as_mut(), if timeout.is_some() => {
                    warn!("server liveness timeout");
                    return Exit::ConnectionLost;
                }
            }
        }
    }
}

/// Resolve, connect, and optionally upgrade to TLS.
async fn connect(config: &BotConfig) -> Result<BotStream, LinkError> {
    let mut addrs = tokio::net::lookup_host((config.server.as_str(), config.port)).await?;
    let addr = addrs
        .find(|a| match config.server_ip_type {
            IpType::Inet4 => a.is_ipv4(),
            IpType::Inet6 => a.is_ipv6(),
        })
        .ok_or_else(|| LinkError::NoAddress {
            host: config.server.clone(),
        })?;

    let tcp = TcpStream::connect(addr).await?;
    if let Err(e) = enable_keepalive(&tcp) {
        warn!(error = %e, "failed to enable tcp keepalive");
    }

    if config.use_ssl {
        tls::upgrade(tcp, &config.server, config.ssl_verify).await
    } else {
        Ok(BotStream::Tcp(tcp))
    }
}

/// Send the registration sequence: PASS (if configured), USER, NICK.
async fn handshake(
    framed: &mut Framed<BotStream, LineCodec>,
    config: &BotConfig,
) -> Result<(), LinkError> {
    if let Some(password) = &config.password {
        framed.send(Message::pass(password)).await?;
    }
    framed.send(Message::user_register(&config.bot_name)).await?;
    framed.send(Message::nick(&config.bot_name)).await?;
    Ok(())
}
