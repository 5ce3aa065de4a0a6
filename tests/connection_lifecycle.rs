//! Connection lifecycle: handshake, housekeeping replies, liveness, and
//! reconnect survival.

mod common;

use std::time::Duration;

use common::{eventually, test_config, TestServer};
use slircb::{Bot, Message};

#[tokio::test]
async fn handshake_sends_pass_user_nick_and_joins_on_welcome() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let mut config = test_config(server.port());
    config.password = Some("sekret".to_string());
    config.channels = vec!["#a".to_string(), "#b".to_string()];

    let handle = Bot::new(config)?.spawn()?;
    let mut conn = server.accept().await?;

    conn.expect_registration("testbot", Some("sekret")).await?;
    conn.welcome("testbot").await?;

    assert_eq!(conn.recv_line().await?, "JOIN #a");
    assert_eq!(conn.recv_line().await?, "JOIN #b");

    handle.shutdown();
    Ok(())
}

#[tokio::test]
async fn ping_is_answered_with_matching_pong() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let handle = Bot::new(test_config(server.port()))?.spawn()?;
    let mut conn = server.accept().await?;

    conn.expect_registration("testbot", None).await?;
    conn.send_line("PING :irc.test").await?;
    assert_eq!(conn.recv_line().await?, "PONG :irc.test");

    handle.shutdown();
    Ok(())
}

#[tokio::test]
async fn nick_in_use_retries_with_underscore() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let handle = Bot::new(test_config(server.port()))?.spawn()?;
    let mut conn = server.accept().await?;

    conn.expect_registration("testbot", None).await?;
    conn.send_line(":irc.test 433 * testbot :Nickname is already in use")
        .await?;
    assert_eq!(conn.recv_line().await?, "NICK testbot_");

    assert!(
        eventually(|| async { handle.current_nick().await == "testbot_" }).await,
        "current nick should track the retry"
    );

    // A second clash appends again.
    conn.send_line(":irc.test 433 * testbot_ :Nickname is already in use")
        .await?;
    assert_eq!(conn.recv_line().await?, "NICK testbot__");

    handle.shutdown();
    Ok(())
}

#[tokio::test]
async fn liveness_timeout_reconnects_and_rejoins_known_channels() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let mut config = test_config(server.port());
    config.channels = vec!["#a".to_string()];
    config.server_timeout = Some(100);

    let handle = Bot::new(config)?.spawn()?;

    let mut conn = server.accept().await?;
    conn.expect_registration("testbot", None).await?;
    conn.welcome("testbot").await?;
    assert_eq!(conn.recv_line().await?, "JOIN #a");
    conn.send_line(":irc.test 353 testbot = #a :@alice bob").await?;

    assert!(
        eventually(|| async {
            match handle.roster().get("#a") {
                Some(chan) => chan.get_user("alice").await.is_some(),
                None => false,
            }
        })
        .await
    );

    // Go silent; the liveness deadline forces a reconnect.
    let mut conn2 = server.accept().await?;
    conn2.expect_registration("testbot", None).await?;
    // Known channel actors are rejoined without waiting for a welcome.
    assert_eq!(conn2.recv_line().await?, "JOIN #a");

    // Channel state survived the reconnect.
    let chan = handle.roster().get("#a").expect("actor survives reconnect");
    assert!(chan.get_user("alice").await.is_some());
    assert!(chan.get_user("bob").await.is_some());

    drop(conn);
    handle.shutdown();
    Ok(())
}

#[tokio::test]
async fn socket_close_reconnects() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let handle = Bot::new(test_config(server.port()))?.spawn()?;

    let mut conn = server.accept().await?;
    conn.expect_registration("testbot", None).await?;
    drop(conn);

    let mut conn2 = server.accept().await?;
    conn2.expect_registration("testbot", None).await?;

    handle.shutdown();
    Ok(())
}

#[tokio::test]
async fn outbound_sends_are_ordered_and_complete() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let handle = Bot::new(test_config(server.port()))?.spawn()?;
    let mut conn = server.accept().await?;
    conn.expect_registration("testbot", None).await?;

    let sender = handle.sender();
    sender.send(Message::privmsg("#a", "first")).await?;
    sender.send(Message::privmsg("#a", "second")).await?;
    sender.send(Message::notice("alice", "third")).await?;

    assert_eq!(conn.recv_line().await?, "PRIVMSG #a :first");
    assert_eq!(conn.recv_line().await?, "PRIVMSG #a :second");
    assert_eq!(conn.recv_line().await?, "NOTICE alice :third");

    handle.shutdown();
    Ok(())
}

#[tokio::test]
async fn unparseable_lines_are_dropped_without_disconnect() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let handle = Bot::new(test_config(server.port()))?.spawn()?;
    let mut conn = server.accept().await?;
    conn.expect_registration("testbot", None).await?;

    // A prefix with no body is a parse error; the connection survives it.
    conn.send_line(":irc.example").await?;
    conn.send_line("PING :still-alive").await?;
    assert_eq!(conn.recv_line().await?, "PONG :still-alive");

    handle.shutdown();
    Ok(())
}

#[tokio::test]
async fn startup_contract_is_enforced() {
    let config = slircb::BotConfig::new("", 6667, "testbot");
    assert!(Bot::new(config).is_err());
}

#[tokio::test]
async fn reconnect_waits_out_the_interval() -> anyhow::Result<()> {
    // Accept and immediately drop the first connection; the bot must come
    // back only after the configured backoff.
    let server = TestServer::bind().await?;
    let mut config = test_config(server.port());
    config.reconnect_interval = 100;

    let handle = Bot::new(config)?.spawn()?;

    let conn = server.accept().await?;
    drop(conn);

    let started = std::time::Instant::now();
    let mut conn2 = server.accept().await?;
    conn2.expect_registration("testbot", None).await?;
    assert!(
        started.elapsed() >= Duration::from_millis(80),
        "reconnect should wait out the interval"
    );

    handle.shutdown();
    Ok(())
}
