//! Scripted test IRC server.
//!
//! Binds an ephemeral port, accepts the bot's connections, and exposes a
//! line-level send/expect API for driving scenarios.

#![allow(dead_code)]

use std::time::Duration;

use anyhow::{bail, Context as _};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::time::timeout;

/// The listening side of a test scenario.
pub struct TestServer {
    listener: TcpListener,
}

impl TestServer {
    /// Bind an ephemeral local port.
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self { listener })
    }

    /// The bound port, for building the bot config.
    pub fn port(&self) -> u16 {
        self.listener.local_addr().map(|a| a.port()).unwrap_or(0)
    }

    /// Accept the bot's next connection.
    pub async fn accept(&self) -> anyhow::Result<TestConn> {
        let (stream, _) = timeout(Duration::from_secs(5), self.listener.accept())
            .await
            .context("timed out waiting for the bot to connect")??;
        let (read_half, write_half) = stream.into_split();
        Ok(TestConn {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }
}

/// One accepted connection from the bot.
pub struct TestConn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestConn {
    /// Send one raw line to the bot; CRLF is appended if missing.
    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with("\r\n") {
            self.writer.write_all(b"\r\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one line from the bot, trailing whitespace trimmed.
    pub async fn recv_line(&mut self) -> anyhow::Result<String> {
        self.recv_line_timeout(Duration::from_secs(5)).await
    }

    /// Receive one line with an explicit timeout.
    pub async fn recv_line_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line))
            .await
            .context("timed out waiting for a line from the bot")??;
        if n == 0 {
            bail!("bot closed the connection");
        }
        Ok(line.trim_end().to_string())
    }

    /// Receive lines until one satisfies the predicate; returns it.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<String>
    where
        F: FnMut(&str) -> bool,
    {
        loop {
            let line = self.recv_line().await?;
            if predicate(&line) {
                return Ok(line);
            }
        }
    }

    /// Expect the registration sequence for `nick` (PASS is asserted only
    /// when `pass` is given), without replying.
    pub async fn expect_registration(
        &mut self,
        nick: &str,
        pass: Option<&str>,
    ) -> anyhow::Result<()> {
        if let Some(pass) = pass {
            let line = self.recv_line().await?;
            assert_eq!(line, format!("PASS {pass}"));
        }
        let line = self.recv_line().await?;
        assert_eq!(line, format!("USER {nick} 8 * :{nick}"));
        let line = self.recv_line().await?;
        assert_eq!(line, format!("NICK {nick}"));
        Ok(())
    }

    /// Send the welcome numeric, which triggers configured channel joins.
    pub async fn welcome(&mut self, nick: &str) -> anyhow::Result<()> {
        self.send_line(&format!(":irc.test 001 {nick} :Welcome to TestNet"))
            .await
    }
}
