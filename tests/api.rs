//! HTTP API integration tests
//!
//! Drive the router with `tower::ServiceExt::oneshot` against a stub chat
//! backend; no network, audio hardware, or clipboard needed.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tokio::sync::Mutex;
use tower::util::ServiceExt;

use interview_coach::api::{router, ApiState};
use interview_coach::{ChatBackend, LeetCodeClient, Message, Result, Role, SessionStore, TranscriptLog};

/// Echoes the last user message, prefixed
struct EchoBackend;

#[async_trait]
impl ChatBackend for EchoBackend {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map_or("", |m| m.content.as_str());
        Ok(format!("stub:{last_user}"))
    }
}

/// Blocks completions until released, standing in for a slow upstream
struct StallingBackend {
    gate: Arc<tokio::sync::Notify>,
}

#[async_trait]
impl ChatBackend for StallingBackend {
    async fn complete(&self, _messages: &[Message]) -> Result<String> {
        self.gate.notified().await;
        Ok("finally".to_string())
    }
}

fn test_state_with(chat: Arc<dyn ChatBackend>) -> Arc<ApiState> {
    let dir = std::env::temp_dir().join(format!("coach-api-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();

    Arc::new(ApiState {
        sessions: Mutex::new(SessionStore::new("persona")),
        chat,
        stt: None,
        tts: None,
        scraper: LeetCodeClient::new().unwrap(),
        transcript: TranscriptLog::new(dir.join("interview_log.txt")),
        problem_dump_path: dir.join("scraped_problems.txt"),
    })
}

fn test_state() -> Arc<ApiState> {
    test_state_with(Arc::new(EchoBackend))
}

fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn chat_requires_message_field() {
    let response = router(test_state())
        .oneshot(json_post("/api/chat", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No message provided");
}

#[tokio::test]
async fn chat_rejects_blank_message() {
    let response = router(test_state())
        .oneshot(json_post("/api/chat", r#"{"message": "   "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_returns_reply_and_caches_it() {
    let state = test_state();

    let response = router(state.clone())
        .oneshot(json_post("/api/chat", r#"{"message": "I'll use a hashmap"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "stub:I'll use a hashmap");

    // The reply lands in the replay cache of the same (default) session
    let response = router(state)
        .oneshot(get("/api/replay"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["response"], "stub:I'll use a hashmap");
}

#[tokio::test]
async fn chat_writes_transcript_lines() {
    let state = test_state();
    let log_path = state.transcript.path().to_path_buf();

    router(state)
        .oneshot(json_post("/api/chat", r#"{"message": "sort it first"}"#))
        .await
        .unwrap();

    let contents = std::fs::read_to_string(log_path).unwrap();
    assert_eq!(contents, "You: sort it first\nAI: stub:sort it first\n");
}

#[tokio::test]
async fn replay_on_fresh_session_is_not_found() {
    let response = router(test_state())
        .oneshot(get("/api/replay"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No cached responses available");
}

#[tokio::test]
async fn cached_responses_lists_recent_replies_in_order() {
    let state = test_state();

    for message in ["one", "two", "three"] {
        router(state.clone())
            .oneshot(json_post(
                "/api/chat",
                &format!(r#"{{"message": "{message}"}}"#),
            ))
            .await
            .unwrap();
    }

    let response = router(state)
        .oneshot(get("/api/cached-responses"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["responses"],
        serde_json::json!(["stub:one", "stub:two", "stub:three"])
    );
}

#[tokio::test]
async fn sessions_are_isolated_by_header() {
    let state = test_state();

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-session-id", "candidate-a")
        .body(Body::from(r#"{"message": "hello from a"}"#))
        .unwrap();
    router(state.clone()).oneshot(request).await.unwrap();

    // Session B has no cached replies
    let request = Request::builder()
        .uri("/api/replay")
        .header("x-session-id", "candidate-b")
        .body(Body::empty())
        .unwrap();
    let response = router(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Session A does
    let request = Request::builder()
        .uri("/api/replay")
        .header("x-session-id", "candidate-a")
        .body(Body::empty())
        .unwrap();
    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn slow_chat_in_one_session_does_not_block_another() {
    let gate = Arc::new(tokio::sync::Notify::new());
    let state = test_state_with(Arc::new(StallingBackend {
        gate: gate.clone(),
    }));

    // Session A's chat turn stalls on the upstream
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-session-id", "candidate-a")
        .body(Body::from(r#"{"message": "thinking out loud"}"#))
        .unwrap();
    let stalled = tokio::spawn(router(state.clone()).oneshot(request));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // Session B stays responsive while A's turn is in flight
    let request = Request::builder()
        .uri("/api/replay")
        .header("x-session-id", "candidate-b")
        .body(Body::empty())
        .unwrap();
    let response = tokio::time::timeout(
        std::time::Duration::from_secs(1),
        router(state).oneshot(request),
    )
    .await
    .expect("replay must not wait on another session's chat turn")
    .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    gate.notify_one();
    let response = stalled.await.unwrap().unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn speak_requires_text_field() {
    let response = router(test_state())
        .oneshot(json_post("/api/speak", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "No text provided");
}

#[tokio::test]
async fn speak_without_synthesis_configured_is_server_error() {
    let response = router(test_state())
        .oneshot(json_post("/api/speak", r#"{"text": "hello"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn record_without_transcription_configured_is_server_error() {
    let response = router(test_state())
        .oneshot(json_post("/api/record", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn leetcode_requires_url_field() {
    let response = router(test_state())
        .oneshot(json_post("/api/leetcode", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "No URL provided");
}

#[tokio::test]
async fn leetcode_rejects_invalid_url_before_any_fetch() {
    let response = router(test_state())
        .oneshot(json_post(
            "/api/leetcode",
            r#"{"url": "https://example.com/foo"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid LeetCode URL");
}
