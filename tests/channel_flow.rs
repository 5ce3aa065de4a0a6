//! Channel actor bookkeeping driven by real protocol traffic.

mod common;

use common::{eventually, test_config, TestServer};
use slircb::{Bot, MemberMode};

#[tokio::test]
async fn names_part_and_nick_shape_membership() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let mut config = test_config(server.port());
    config.channels = vec!["#c".to_string()];

    let handle = Bot::new(config)?.spawn()?;
    let mut conn = server.accept().await?;
    conn.expect_registration("testbot", None).await?;
    conn.welcome("testbot").await?;
    assert_eq!(conn.recv_line().await?, "JOIN #c");

    conn.send_line(":irc.test 353 testbot = #c :@alice +bob carol")
        .await?;
    conn.send_line(":alice!a@host PART #c :bye").await?;
    conn.send_line(":bob!b@host NICK :robert").await?;

    assert!(
        eventually(|| async {
            match handle.roster().get("#c") {
                Some(chan) => {
                    chan.get_user("alice").await.is_none()
                        && chan.get_user("robert").await.is_some()
                }
                None => false,
            }
        })
        .await
    );

    let chan = handle.roster().get("#c").unwrap();
    assert_eq!(chan.get_user("carol").await.unwrap().mode, MemberMode::Normal);
    assert_eq!(chan.get_user("robert").await.unwrap().mode, MemberMode::Voice);
    assert!(chan.get_user("bob").await.is_none());
    assert_eq!(chan.member_count().await, 2);

    handle.shutdown();
    Ok(())
}

#[tokio::test]
async fn quit_removes_from_every_channel() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let mut config = test_config(server.port());
    config.channels = vec!["#a".to_string(), "#b".to_string()];

    let handle = Bot::new(config)?.spawn()?;
    let mut conn = server.accept().await?;
    conn.expect_registration("testbot", None).await?;
    conn.welcome("testbot").await?;
    assert_eq!(conn.recv_line().await?, "JOIN #a");
    assert_eq!(conn.recv_line().await?, "JOIN #b");

    conn.send_line(":irc.test 353 testbot = #a :alice bob").await?;
    conn.send_line(":irc.test 353 testbot = #b :alice").await?;
    conn.send_line(":alice!a@host QUIT :gone").await?;

    assert!(
        eventually(|| async {
            let a = handle.roster().get("#a").unwrap();
            let b = handle.roster().get("#b").unwrap();
            a.get_user("alice").await.is_none()
                && b.get_user("alice").await.is_none()
                && a.get_user("bob").await.is_some()
        })
        .await
    );

    handle.shutdown();
    Ok(())
}

#[tokio::test]
async fn join_creates_and_populates_an_actor() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let handle = Bot::new(test_config(server.port()))?.spawn()?;
    let mut conn = server.accept().await?;
    conn.expect_registration("testbot", None).await?;

    // Someone joins a channel we had no actor for yet.
    conn.send_line(":dora!d@host JOIN :#new").await?;

    assert!(
        eventually(|| async {
            match handle.roster().get("#new") {
                Some(chan) => chan.get_user("dora").await.is_some(),
                None => false,
            }
        })
        .await
    );

    handle.shutdown();
    Ok(())
}

#[tokio::test]
async fn mode_grants_voice_and_op_only() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let mut config = test_config(server.port());
    config.channels = vec!["#c".to_string()];

    let handle = Bot::new(config)?.spawn()?;
    let mut conn = server.accept().await?;
    conn.expect_registration("testbot", None).await?;
    conn.welcome("testbot").await?;
    assert_eq!(conn.recv_line().await?, "JOIN #c");

    conn.send_line(":irc.test 353 testbot = #c :carol dave").await?;
    conn.send_line(":irc.test MODE #c +v carol").await?;
    conn.send_line(":irc.test MODE #c +o dave").await?;
    // Removals and unknown modes are ignored.
    conn.send_line(":irc.test MODE #c -v carol").await?;
    conn.send_line(":irc.test MODE #c +m").await?;

    assert!(
        eventually(|| async {
            let chan = handle.roster().get("#c").unwrap();
            chan.get_user("dave").await.map(|m| m.mode) == Some(MemberMode::Op)
        })
        .await
    );
    let chan = handle.roster().get("#c").unwrap();
    assert_eq!(chan.get_user("carol").await.unwrap().mode, MemberMode::Voice);

    handle.shutdown();
    Ok(())
}

#[tokio::test]
async fn privmsg_lands_in_channel_buffer_newest_first() -> anyhow::Result<()> {
    let server = TestServer::bind().await?;
    let mut config = test_config(server.port());
    config.channels = vec!["#c".to_string()];

    let handle = Bot::new(config)?.spawn()?;
    let mut conn = server.accept().await?;
    conn.expect_registration("testbot", None).await?;
    conn.welcome("testbot").await?;
    assert_eq!(conn.recv_line().await?, "JOIN #c");

    conn.send_line(":alice!a@host PRIVMSG #c :one").await?;
    conn.send_line(":alice!a@host PRIVMSG #c :two").await?;
    // Private messages have no channel actor and are not buffered.
    conn.send_line(":alice!a@host PRIVMSG testbot :direct").await?;

    assert!(
        eventually(|| async {
            let chan = handle.roster().get("#c").unwrap();
            chan.with_buffer(|buf| buf.len()).await == Some(2)
        })
        .await
    );

    let chan = handle.roster().get("#c").unwrap();
    let texts = chan
        .with_buffer(|buf| buf.iter().map(|m| m.trailing.clone()).collect::<Vec<_>>())
        .await
        .unwrap();
    assert_eq!(texts, vec!["two", "one"]);

    handle.shutdown();
    Ok(())
}
