//! Chat session integration tests
//!
//! Each test starts its own gateway on a loopback port with in-memory
//! history and profiles.
//!
//! Run with: cargo test -p integration-tests --test chat_tests

use std::time::Duration;

use chrono::Utc;
use integration_tests::{test_config, test_profiles, wait_until, TestServer, ALICE, BOB, CAROL};
use lingua_core::{ChatMessage, MessageHistoryStore, MAX_MESSAGE_LENGTH};
use lingua_gateway::protocol::ServerFrame;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

const QUIET: Duration = Duration::from_millis(300);

// ============================================================================
// Relay
// ============================================================================

#[tokio::test]
async fn test_message_reaches_room_members_only() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.join(ALICE, "r1").await.unwrap();
    let mut bob = server.join(BOB, "r1").await.unwrap();
    let mut carol = server.join(CAROL, "r2").await.unwrap();

    assert_eq!(alice.username.as_deref(), Some("alice"));

    alice.say("hello").await.unwrap();

    let to_alice = alice.expect_message().await.unwrap();
    let to_bob = bob.expect_message().await.unwrap();

    assert_eq!(to_alice, to_bob);
    assert_eq!(to_bob.sender, "alice");
    assert_eq!(to_bob.text, "hello");
    assert_eq!(to_bob.room_id, "r1");

    carol.expect_silence(QUIET).await.unwrap();
}

#[tokio::test]
async fn test_sender_comes_from_credential() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.join(ALICE, "r1").await.unwrap();

    alice
        .send_raw(Message::Text(
            json!({ "text": "hi", "sender": "mallory" }).to_string(),
        ))
        .await
        .unwrap();

    let message = alice.expect_message().await.unwrap();
    assert_eq!(message.sender, "alice");
}

#[tokio::test]
async fn test_sole_member_gets_empty_history_and_own_message() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.join(ALICE, "quiet-room").await.unwrap();

    assert!(alice.history.is_empty());

    alice.say("anyone here?").await.unwrap();
    let message = alice.expect_message().await.unwrap();

    assert_eq!(message.text, "anyone here?");
    assert_eq!(server.history.len(), 1);
}

#[tokio::test]
async fn test_messages_from_one_sender_keep_their_order() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.join(ALICE, "r1").await.unwrap();
    let mut bob = server.join(BOB, "r1").await.unwrap();

    for i in 0..20 {
        alice.say(&format!("m{i}")).await.unwrap();
    }

    for i in 0..20 {
        assert_eq!(bob.expect_message().await.unwrap().text, format!("m{i}"));
    }
}

#[tokio::test]
async fn test_relayed_messages_are_recorded() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.join(ALICE, "r1").await.unwrap();

    alice.say("keep me").await.unwrap();
    alice.expect_message().await.unwrap();

    let stored = server.history.read("r1").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].sender, "alice");
    assert_eq!(stored[0].text, "keep me");
}

// ============================================================================
// History replay
// ============================================================================

#[tokio::test]
async fn test_history_replayed_oldest_first_on_join() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.join(ALICE, "r1").await.unwrap();

    for text in ["one", "two", "three"] {
        alice.say(text).await.unwrap();
        alice.expect_message().await.unwrap();
    }

    let bob = server.join(BOB, "r1").await.unwrap();
    let texts: Vec<_> = bob.history.iter().map(|m| m.text.as_str()).collect();

    assert_eq!(texts, ["one", "two", "three"]);
    assert!(bob.history.iter().all(|m| m.room_id == "r1"));
}

#[tokio::test]
async fn test_history_of_other_rooms_is_not_replayed() {
    let server = TestServer::start().await.unwrap();
    let now = Utc::now();
    server
        .history
        .append(&ChatMessage::at("carol", "elsewhere", "r2", now))
        .await
        .unwrap();
    server
        .history
        .append(&ChatMessage::at("bob", "here", "r1", now))
        .await
        .unwrap();

    let alice = server.join(ALICE, "r1").await.unwrap();

    assert_eq!(alice.history.len(), 1);
    assert_eq!(alice.history[0].text, "here");
}

#[tokio::test]
async fn test_history_failure_closes_with_internal_error() {
    let server = TestServer::start().await.unwrap();
    server.history.set_unavailable(true);

    let token = server.credential(ALICE, "r1");
    let mut alice = server.connect("r1", &token).await.unwrap();

    assert_eq!(
        alice.next_frame().await.unwrap(),
        ServerFrame::user_info("alice")
    );
    assert_eq!(alice.expect_close().await.unwrap(), 1011);
    assert!(wait_until(|| server.members_of("r1").is_empty()).await);
}

#[tokio::test]
async fn test_append_failure_closes_sender_and_broadcasts_nothing() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.join(ALICE, "r1").await.unwrap();
    let mut bob = server.join(BOB, "r1").await.unwrap();

    server.history.set_unavailable(true);
    alice.say("hi").await.unwrap();

    assert_eq!(alice.expect_close().await.unwrap(), 1011);
    bob.expect_silence(QUIET).await.unwrap();
    assert!(wait_until(|| server.members_of("r1") == ["bob"]).await);
    assert!(server.history.is_empty());
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn test_expired_credential_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let issued = Utc::now() - chrono::Duration::minutes(16);
    let token = server
        .authority()
        .issue_at(ALICE.0, ALICE.1, "r1", Duration::from_secs(15 * 60), issued)
        .unwrap();

    let mut alice = server.connect("r1", &token).await.unwrap();

    assert_eq!(alice.expect_close().await.unwrap(), 1008);
    assert!(server.members_of("r1").is_empty());
}

#[tokio::test]
async fn test_credential_for_other_room_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let token = server.credential(ALICE, "r1");

    let mut alice = server.connect("r2", &token).await.unwrap();

    assert_eq!(alice.expect_close().await.unwrap(), 1008);
    assert!(server.members_of("r1").is_empty());
    assert!(server.members_of("r2").is_empty());
}

#[tokio::test]
async fn test_garbage_and_missing_credentials_are_rejected() {
    let server = TestServer::start().await.unwrap();

    let mut garbage = server.connect("r1", "not-a-token").await.unwrap();
    assert_eq!(garbage.expect_close().await.unwrap(), 1008);

    let url = format!("ws://{}/ws/chat?room_id=r1", server.addr);
    let mut missing = integration_tests::ChatClient::connect(&url).await.unwrap();
    assert_eq!(missing.expect_close().await.unwrap(), 1008);

    assert_eq!(server.state.registry().connection_count(), 0);
}

// ============================================================================
// Membership
// ============================================================================

#[tokio::test]
async fn test_disconnect_leaves_room() {
    let server = TestServer::start().await.unwrap();
    let alice = server.join(ALICE, "r1").await.unwrap();
    let mut bob = server.join(BOB, "r1").await.unwrap();

    assert!(wait_until(|| server.members_of("r1").len() == 2).await);

    alice.close().await.unwrap();
    assert!(wait_until(|| server.members_of("r1") == ["bob"]).await);

    bob.say("still here").await.unwrap();
    assert_eq!(bob.expect_message().await.unwrap().text, "still here");
}

#[tokio::test]
async fn test_last_member_leaving_removes_room() {
    let server = TestServer::start().await.unwrap();
    let alice = server.join(ALICE, "r1").await.unwrap();

    alice.close().await.unwrap();

    assert!(wait_until(|| server.state.registry().room_count() == 0).await);
}

#[tokio::test]
async fn test_same_nickname_supersedes_previous_session() {
    let server = TestServer::start().await.unwrap();
    let mut first = server.join(ALICE, "r1").await.unwrap();
    let mut second = server.join(ALICE, "r1").await.unwrap();

    assert_eq!(first.expect_close().await.unwrap(), 4000);
    assert!(wait_until(|| server.members_of("r1") == ["alice"]).await);

    second.say("I moved tabs").await.unwrap();
    assert_eq!(second.expect_message().await.unwrap().text, "I moved tabs");
}

// ============================================================================
// Protocol violations
// ============================================================================

#[tokio::test]
async fn test_binary_frame_closes_connection() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.join(ALICE, "r1").await.unwrap();

    alice.send_raw(Message::Binary(vec![1, 2, 3])).await.unwrap();

    assert_eq!(alice.expect_close().await.unwrap(), 1003);
    assert!(wait_until(|| server.members_of("r1").is_empty()).await);
}

#[tokio::test]
async fn test_malformed_json_closes_connection() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.join(ALICE, "r1").await.unwrap();

    alice
        .send_raw(Message::Text("{not json".to_string()))
        .await
        .unwrap();

    assert_eq!(alice.expect_close().await.unwrap(), 1007);
}

#[tokio::test]
async fn test_oversized_message_is_refused() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.join(ALICE, "r1").await.unwrap();
    let mut bob = server.join(BOB, "r1").await.unwrap();

    alice
        .say(&"x".repeat(MAX_MESSAGE_LENGTH + 1))
        .await
        .unwrap();

    assert_eq!(alice.expect_close().await.unwrap(), 1009);
    bob.expect_silence(QUIET).await.unwrap();
    assert!(server.history.is_empty());
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let mut config = test_config();
    config.chat.idle_timeout_secs = 1;
    let server = TestServer::start_with(config, test_profiles()).await.unwrap();

    let mut alice = server.join(ALICE, "r1").await.unwrap();

    assert_eq!(alice.expect_close().await.unwrap(), 4002);
    assert!(wait_until(|| server.members_of("r1").is_empty()).await);
}
