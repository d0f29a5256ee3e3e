//! HTTP API server for the interview coach

pub mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::chat::{ChatBackend, ChatClient};
use crate::config::Config;
use crate::scrape::LeetCodeClient;
use crate::session::SessionStore;
use crate::transcript::TranscriptLog;
use crate::voice::{SpeechToText, TextToSpeech};
use crate::{Error, Result};

/// Shared state for API handlers
pub struct ApiState {
    /// Per-client conversation sessions
    pub sessions: Mutex<SessionStore>,

    /// Chat collaborator
    pub chat: Arc<dyn ChatBackend>,

    /// Transcription collaborator; absent on voice-disabled hosts
    pub stt: Option<Arc<SpeechToText>>,

    /// Synthesis collaborator; absent on voice-disabled hosts
    pub tts: Option<Arc<TextToSpeech>>,

    /// Problem-fetch collaborator
    pub scraper: LeetCodeClient,

    /// Append-only interview transcript
    pub transcript: TranscriptLog,

    /// Where the plain-text problem dump lands
    pub problem_dump_path: PathBuf,
}

impl ApiState {
    /// Build API state from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the chat API key is missing or a client cannot be
    /// built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let chat = ChatClient::new(
            config.api_keys.deepseek.clone().unwrap_or_default(),
            config.chat.base_url.clone(),
            config.chat.model.clone(),
        )?;

        // Voice endpoints need an OpenAI key; without one they report a
        // collaborator failure instead of blocking startup
        let (stt, tts) = match (config.voice.enabled, config.api_keys.openai.clone()) {
            (true, Some(openai_key)) => {
                let stt = SpeechToText::new(openai_key.clone(), config.voice.stt_model.clone())?;
                let tts = TextToSpeech::new(
                    openai_key,
                    config.voice.tts_model.clone(),
                    config.voice.tts_voice.clone(),
                    config.voice.tts_speed,
                )?;
                (Some(Arc::new(stt)), Some(Arc::new(tts)))
            }
            (true, None) => {
                tracing::warn!("OPENAI_API_KEY not set, voice endpoints unavailable");
                (None, None)
            }
            (false, _) => (None, None),
        };

        Ok(Self {
            sessions: Mutex::new(SessionStore::new(config.persona_prompt.clone())),
            chat: Arc::new(chat),
            stt,
            tts,
            scraper: LeetCodeClient::new()?,
            transcript: TranscriptLog::new(config.transcript_path.clone()),
            problem_dump_path: config.problem_dump_path.clone(),
        })
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/record", post(handlers::record))
        .route("/api/speak", post(handlers::speak))
        .route("/api/chat", post(handlers::chat))
        .route("/api/replay", get(handlers::replay))
        .route("/api/cached-responses", get(handlers::cached_responses))
        .route("/api/clipboard", post(handlers::clipboard))
        .route("/api/leetcode", post(handlers::leetcode))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// HTTP API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server for the given state and port
    #[must_use]
    pub fn new(state: Arc<ApiState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Run the API server until the process exits
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or serve.
    pub async fn run(self) -> Result<()> {
        let addr = format!("127.0.0.1:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}
