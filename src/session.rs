//! Conversation state for interview sessions
//!
//! Owns the ordered message history sent to the chat backend and the bounded
//! cache of recent assistant replies. The persona prompt is pinned at index 0
//! and survives every trim; everything else scrolls.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::chat::ChatBackend;
use crate::{Error, Result};

/// Hard cap on conversation history length, checked after every assistant turn
pub const MAX_HISTORY_MESSAGES: usize = 20;

/// Capacity of the assistant reply cache (FIFO, oldest dropped first)
pub const REPLY_CACHE_CAPACITY: usize = 5;

/// Session ID used when a client does not supply one
pub const DEFAULT_SESSION_ID: &str = "default";

/// Role of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single conversation message, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One interview conversation: message history plus reply cache
#[derive(Debug)]
pub struct Session {
    history: Vec<Message>,
    replies: VecDeque<String>,
}

impl Session {
    /// Create a session seeded with the persona prompt as the sole message
    #[must_use]
    pub fn new(persona_prompt: impl Into<String>) -> Self {
        Self {
            history: vec![Message::system(persona_prompt)],
            replies: VecDeque::with_capacity(REPLY_CACHE_CAPACITY),
        }
    }

    /// Insert or replace the supplementary context block after the persona
    /// prompt
    ///
    /// A single context slot lives at index 1: repeated calls replace its
    /// content rather than stacking additional system messages. The slot is
    /// not pinned, so after enough turns the trim policy can evict it.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `text` is empty after trimming
    /// whitespace; history is left unchanged.
    pub fn inject_context(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput(
                "context text must not be empty".to_string(),
            ));
        }

        let content = format!("Additional context:\n{text}");
        match self.history.get_mut(1) {
            Some(slot) if slot.role == Role::System => {
                slot.content = content;
                tracing::debug!("replaced context slot");
            }
            _ => {
                self.history.insert(1, Message::system(content));
                tracing::debug!(history_len = self.history.len(), "inserted context slot");
            }
        }

        Ok(())
    }

    /// Append a user turn to the history
    ///
    /// No length check happens here; trimming runs after the assistant turn.
    pub fn record_user_turn(&mut self, text: impl Into<String>) {
        self.history.push(Message::user(text));
    }

    /// Send the full history to the chat backend and record its reply
    ///
    /// On success the reply is appended to history, pushed into the reply
    /// cache (evicting the oldest entry at capacity), and the trim policy is
    /// applied. On failure nothing is appended: the pending user turn stays
    /// in history exactly once, so a retry re-sends the same turn.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged if the chat call fails.
    pub async fn request_assistant_reply(&mut self, chat: &dyn ChatBackend) -> Result<String> {
        let reply = chat.complete(&self.history).await?;

        self.history.push(Message::assistant(reply.clone()));

        if self.replies.len() == REPLY_CACHE_CAPACITY {
            self.replies.pop_front();
        }
        self.replies.push_back(reply.clone());

        self.trim_history();

        Ok(reply)
    }

    /// Trim history to `[history[0]] + last 19 messages` when over the cap
    ///
    /// Only index 0 is special-cased; context messages that have scrolled
    /// past the retained window are evicted like anything else.
    fn trim_history(&mut self) {
        if self.history.len() <= MAX_HISTORY_MESSAGES {
            return;
        }

        let keep_from = self.history.len() - (MAX_HISTORY_MESSAGES - 1);
        let dropped = self.history.drain(1..keep_from).count();
        tracing::debug!(dropped, "trimmed conversation history");
    }

    /// Most recent assistant reply, or `None` before the first assistant turn
    #[must_use]
    pub fn last_reply(&self) -> Option<&str> {
        self.replies.back().map(String::as_str)
    }

    /// Cached assistant replies, most recent last
    #[must_use]
    pub fn cached_replies(&self) -> Vec<&str> {
        self.replies.iter().map(String::as_str).collect()
    }

    /// Full conversation history
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }
}

/// Sessions keyed by client-supplied identifier
///
/// Replaces the process-wide mutable history/cache with per-session state so
/// concurrent HTTP clients cannot interleave turns in each other's
/// conversations. Each session carries its own lock: the store is only held
/// long enough to look a session up, so a slow turn in one conversation
/// never blocks the others.
#[derive(Debug)]
pub struct SessionStore {
    persona_prompt: String,
    sessions: HashMap<String, Arc<Mutex<Session>>>,
}

impl SessionStore {
    /// Create a store that seeds every new session with `persona_prompt`
    #[must_use]
    pub fn new(persona_prompt: impl Into<String>) -> Self {
        Self {
            persona_prompt: persona_prompt.into(),
            sessions: HashMap::new(),
        }
    }

    /// Fetch the session for `id`, creating it on first use
    pub fn get_or_create(&mut self, id: &str) -> Arc<Mutex<Session>> {
        Arc::clone(
            self.sessions
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Session::new(self.persona_prompt.clone())))),
        )
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether any session exists yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
