//! Conversation session scenario tests
//!
//! Exercise the session core end to end with stub chat backends, without any
//! network or audio hardware.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use interview_coach::session::{MAX_HISTORY_MESSAGES, REPLY_CACHE_CAPACITY};
use interview_coach::{ChatBackend, Message, Result, Role, Session};

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

/// Records how many messages each request carried
struct RecordingBackend {
    sent_lengths: Mutex<Vec<usize>>,
    calls: AtomicUsize,
}

impl RecordingBackend {
    fn new() -> Self {
        Self {
            sent_lengths: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ChatBackend for RecordingBackend {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.sent_lengths.lock().unwrap().push(messages.len());
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("reply {n}"))
    }
}

#[tokio::test]
async fn full_interview_flow_holds_invariants() {
    let mut session = Session::new("you are the interviewer");
    session
        .inject_context("Title: Two Sum\nDifficulty: Easy")
        .unwrap();

    for i in 0..25 {
        session.record_user_turn(format!("answer {i}"));
        let reply = session.request_assistant_reply(&EchoBackend).await.unwrap();
        assert_eq!(reply, format!("stub:answer {i}"));

        // The cap is checked after every assistant turn
        assert!(session.history().len() <= MAX_HISTORY_MESSAGES);
        assert!(session.cached_replies().len() <= REPLY_CACHE_CAPACITY);
    }

    // Persona prompt survives every trim
    assert_eq!(session.history()[0].role, Role::System);
    assert_eq!(session.history()[0].content, "you are the interviewer");
    assert_eq!(session.history().len(), MAX_HISTORY_MESSAGES);

    // Cache holds the most recent five replies in chronological order
    assert_eq!(
        session.cached_replies(),
        vec![
            "stub:answer 20",
            "stub:answer 21",
            "stub:answer 22",
            "stub:answer 23",
            "stub:answer 24"
        ]
    );
    assert_eq!(session.last_reply(), Some("stub:answer 24"));
}

#[tokio::test]
async fn context_slot_is_not_pinned_and_scrolls_out() {
    let mut session = Session::new("persona");
    session.inject_context("the problem statement").unwrap();
    assert_eq!(session.history()[1].role, Role::System);

    // Enough turns to push the context slot past the retained window
    for i in 0..25 {
        session.record_user_turn(format!("turn {i}"));
        session.request_assistant_reply(&EchoBackend).await.unwrap();
    }

    // Only index 0 is pinned; the context message was evicted with the rest
    assert_eq!(session.history()[0].content, "persona");
    assert!(session
        .history()
        .iter()
        .skip(1)
        .all(|m| m.role != Role::System));
}

#[tokio::test]
async fn full_history_is_sent_on_every_request() {
    let backend = RecordingBackend::new();
    let mut session = Session::new("persona");

    session.record_user_turn("first");
    session.request_assistant_reply(&backend).await.unwrap();

    session.record_user_turn("second");
    session.request_assistant_reply(&backend).await.unwrap();

    // First call sees [system, user]; second sees the whole transcript so far
    let lengths = backend.sent_lengths.lock().unwrap().clone();
    assert_eq!(lengths, vec![2, 4]);
}

#[tokio::test]
async fn context_injection_does_not_consume_cache_or_trigger_trim() {
    let mut session = Session::new("persona");

    for _ in 0..3 {
        session.inject_context("updated problem context").unwrap();
    }

    // Replace semantics: one slot, no cache entries, no trim activity
    assert_eq!(session.history().len(), 2);
    assert!(session.cached_replies().is_empty());
    assert_eq!(session.last_reply(), None);
}
