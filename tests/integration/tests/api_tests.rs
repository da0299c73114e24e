//! HTTP API integration tests
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::{assert_json, assert_status, wait_until, TestServer, ALICE, BOB};
use lingua_gateway::handlers::{HealthResponse, NotifyResponse, RoomStatusResponse, TokenResponse};
use lingua_gateway::protocol::ServerFrame;
use reqwest::StatusCode;
use serde_json::json;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check_counts_connections() {
    let server = TestServer::start().await.unwrap();

    let response = server.get("/health").await.unwrap();
    let health: HealthResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.connections, 0);

    let _alice = server.join(ALICE, "r1").await.unwrap();
    let _bob = server.join(BOB, "r2").await.unwrap();

    let response = server.get("/health").await.unwrap();
    let health: HealthResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(health.connections, 2);
    assert_eq!(health.rooms, 2);
}

// ============================================================================
// Credential issuance
// ============================================================================

#[tokio::test]
async fn test_create_token_for_known_user() {
    let server = TestServer::start().await.unwrap();

    let response = server
        .get("/api/user/create_token?user_id=1&room_id=r1")
        .await
        .unwrap();
    let body: TokenResponse = assert_json(response, StatusCode::OK).await.unwrap();

    let claims = server.authority().authorize(&body.token, "r1").unwrap();
    assert_eq!(claims.user_id, ALICE.0);
    assert_eq!(claims.nickname, "alice");
    assert_eq!(claims.room_id, "r1");

    let mut alice = server.connect("r1", &body.token).await.unwrap();
    alice.read_greeting().await.unwrap();
    assert_eq!(alice.username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_create_token_for_unknown_user() {
    let server = TestServer::start().await.unwrap();

    let response = server
        .get("/api/user/create_token?user_id=999&room_id=r1")
        .await
        .unwrap();

    assert_status(response, StatusCode::NOT_FOUND).await.unwrap();
}

#[tokio::test]
async fn test_create_token_rejects_bad_query() {
    let server = TestServer::start().await.unwrap();

    for path in [
        "/api/user/create_token?room_id=r1",
        "/api/user/create_token?user_id=abc&room_id=r1",
        "/api/user/create_token?user_id=1&room_id=",
    ] {
        let response = server.get(path).await.unwrap();
        assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
    }
}

// ============================================================================
// Room status
// ============================================================================

#[tokio::test]
async fn test_room_status_lists_online_users() {
    let server = TestServer::start().await.unwrap();
    let _alice = server.join(ALICE, "r1").await.unwrap();
    let _bob = server.join(BOB, "r1").await.unwrap();

    let response = server.get("/api/worker/chat/rooms/r1/status").await.unwrap();
    let status: RoomStatusResponse = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(status.room_id, "r1");
    assert_eq!(status.user_count, 2);
    let mut users = status.online_users;
    users.sort();
    assert_eq!(users, ["alice", "bob"]);
}

#[tokio::test]
async fn test_room_status_for_empty_room() {
    let server = TestServer::start().await.unwrap();

    let response = server.get("/api/worker/chat/rooms/nobody/status").await.unwrap();
    let status: RoomStatusResponse = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(status.user_count, 0);
    assert!(status.online_users.is_empty());
}

#[tokio::test]
async fn test_room_status_drops_departed_users() {
    let server = TestServer::start().await.unwrap();
    let alice = server.join(ALICE, "r1").await.unwrap();
    let _bob = server.join(BOB, "r1").await.unwrap();

    alice.close().await.unwrap();
    assert!(wait_until(|| server.members_of("r1").len() == 1).await);

    let response = server.get("/api/worker/chat/rooms/r1/status").await.unwrap();
    let status: RoomStatusResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(status.online_users, ["bob"]);
}

// ============================================================================
// Session end
// ============================================================================

#[tokio::test]
async fn test_notify_session_end_reaches_room() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.join(ALICE, "r1").await.unwrap();
    let mut bob = server.join(BOB, "r1").await.unwrap();

    let response = server
        .post(
            "/api/worker/notify_session_end",
            &json!({ "room_id": "r1", "reason": "Time is up" }),
        )
        .await
        .unwrap();
    let body: NotifyResponse = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body.status, "success");
    assert_eq!(body.delivered, 2);
    for client in [&mut alice, &mut bob] {
        assert_eq!(
            client.next_frame().await.unwrap(),
            ServerFrame::session_ended("Time is up")
        );
    }

    // Members stay connected until they leave
    alice.say("bye").await.unwrap();
    assert_eq!(bob.expect_message().await.unwrap().text, "bye");
}

#[tokio::test]
async fn test_notify_session_end_default_reason() {
    let server = TestServer::start().await.unwrap();
    let mut alice = server.join(ALICE, "r1").await.unwrap();

    let response = server
        .post("/api/worker/notify_session_end", &json!({ "room_id": "r1" }))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    assert_eq!(
        alice.next_frame().await.unwrap(),
        ServerFrame::session_ended("Session ended")
    );
}

#[tokio::test]
async fn test_notify_session_end_requires_room_id() {
    let server = TestServer::start().await.unwrap();

    for body in [json!({}), json!({ "room_id": "" }), json!({ "reason": "x" })] {
        let response = server
            .post("/api/worker/notify_session_end", &body)
            .await
            .unwrap();
        assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
    }
}

#[tokio::test]
async fn test_notify_session_end_for_empty_room() {
    let server = TestServer::start().await.unwrap();

    let response = server
        .post("/api/worker/notify_session_end", &json!({ "room_id": "nobody" }))
        .await
        .unwrap();
    let body: NotifyResponse = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body.delivered, 0);
}
