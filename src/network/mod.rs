//! Connection management: socket ownership, handshake, liveness, and
//! reconnect.

mod link;
mod tls;

pub use link::{ConnHandle, Link};

use thiserror::Error;

/// Errors establishing or running a connection. These never escape the
/// connection manager; they select the reconnect path and the log line.
#[derive(Debug, Error)]
pub enum LinkError {
    /// DNS resolution yielded no address of the configured family.
    #[error("no usable address for {host}")]
    NoAddress {
        /// The configured host.
        host: String,
    },

    /// Socket-level failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configured host is not a valid TLS server name.
    #[error("invalid server name: {0}")]
    ServerName(String),

    /// Protocol-level failure during the handshake writes.
    #[error(transparent)]
    Protocol(#[from] slircb_proto::ProtocolError),
}
