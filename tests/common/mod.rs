//! Integration test common infrastructure.
//!
//! Provides a scripted in-process IRC server and small helpers for
//! asserting on message flows.

pub mod server;

#[allow(unused_imports)]
pub use server::{TestConn, TestServer};

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use slircb::BotConfig;

static INIT: Once = Once::new();

/// Opt-in test logging: `RUST_LOG=debug cargo test -- --nocapture`.
#[allow(dead_code)]
pub fn init_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A config pointed at the local test server, with fast reconnects.
#[allow(dead_code)]
pub fn test_config(port: u16) -> BotConfig {
    let mut config = BotConfig::new("127.0.0.1", port, "testbot");
    config.reconnect_interval = 50;
    config
}

/// Poll an async condition until it holds or a deadline passes.
#[allow(dead_code)]
pub async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..150 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
