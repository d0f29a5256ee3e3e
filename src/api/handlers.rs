//! Request handlers for the interview coach API

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::scrape::{self, Problem};
use crate::session::DEFAULT_SESSION_ID;
use crate::voice::{record_utterance, samples_to_wav, AudioPlayback, SAMPLE_RATE};
use crate::{clipboard, Error};

use super::ApiState;

/// Longest recording accepted for one answer
const MAX_RECORDING: Duration = Duration::from_secs(60);

/// Opening turn sent after a problem is scraped into context
const INTRO_PROMPT: &str = "Introduce yourself and what problem you want me to solve today";

/// Header clients use to select their conversation session
const SESSION_HEADER: &str = "x-session-id";

fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(DEFAULT_SESSION_ID)
        .to_string()
}

/// API error rendered as `{ "success": false, "error": … }`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidInput(msg) => Self::BadRequest(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            success: bool,
            error: String,
        }

        let (status, error) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}

/// Transcription of one recorded answer
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub success: bool,
    pub transcription: String,
}

/// Record one utterance from the microphone and transcribe it
///
/// A cancelled or silent recording yields an empty transcription, not an
/// error; nothing is appended to any session here.
pub async fn record(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<RecordResponse>, ApiError> {
    let stt = state
        .stt
        .as_ref()
        .ok_or_else(|| ApiError::Internal("transcription not configured".to_string()))?
        .clone();

    let samples = tokio::task::spawn_blocking(|| {
        let cancel = AtomicBool::new(false);
        record_utterance(&cancel, MAX_RECORDING)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("recording task failed: {e}")))??;

    let Some(samples) = samples else {
        tracing::info!("no speech captured");
        return Ok(Json(RecordResponse {
            success: true,
            transcription: String::new(),
        }));
    };

    let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
    let transcription = stt.transcribe(wav).await?;

    Ok(Json(RecordResponse {
        success: true,
        transcription,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpeakResponse {
    pub success: bool,
}

/// Synthesize text and play it on the default output device
pub async fn speak(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SpeakRequest>,
) -> Result<Json<SpeakResponse>, ApiError> {
    let text = request
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No text provided".to_string()))?;

    let tts = state
        .tts
        .as_ref()
        .ok_or_else(|| ApiError::Internal("synthesis not configured".to_string()))?;

    let audio = tts.synthesize(&text).await?;

    tokio::task::spawn_blocking(move || AudioPlayback::new()?.play_mp3(&audio))
        .await
        .map_err(|e| ApiError::Internal(format!("playback task failed: {e}")))??;

    Ok(Json(SpeakResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
}

/// Run one interview turn: record the candidate's message, get the
/// interviewer's reply
pub async fn chat(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No message provided".to_string()))?;

    // The store lock covers only the lookup; a slow completion in one
    // session must not stall the others
    let id = session_id(&headers);
    let session = state.sessions.lock().await.get_or_create(&id);
    let mut session = session.lock().await;

    session.record_user_turn(&message);
    if let Err(e) = state.transcript.record_user(&message) {
        tracing::warn!(error = %e, "failed to write transcript");
    }

    // On failure the pending user turn stays in history exactly once and the
    // next attempt re-sends it
    let response = session.request_assistant_reply(state.chat.as_ref()).await?;

    if let Err(e) = state.transcript.record_assistant(&response) {
        tracing::warn!(error = %e, "failed to write transcript");
    }

    Ok(Json(ChatResponse {
        success: true,
        response,
    }))
}

#[derive(Debug, Serialize)]
pub struct ReplayResponse {
    pub success: bool,
    pub response: String,
}

/// Return the most recent cached reply
pub async fn replay(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<ReplayResponse>, ApiError> {
    let id = session_id(&headers);
    let session = state.sessions.lock().await.get_or_create(&id);
    let session = session.lock().await;

    let response = session
        .last_reply()
        .ok_or_else(|| ApiError::NotFound("No cached responses available".to_string()))?
        .to_string();

    Ok(Json(ReplayResponse {
        success: true,
        response,
    }))
}

#[derive(Debug, Serialize)]
pub struct CachedResponses {
    pub success: bool,
    pub responses: Vec<String>,
}

/// Return all cached replies, most recent last
pub async fn cached_responses(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Json<CachedResponses> {
    let id = session_id(&headers);
    let session = state.sessions.lock().await.get_or_create(&id);
    let session = session.lock().await;

    Json(CachedResponses {
        success: true,
        responses: session
            .cached_replies()
            .into_iter()
            .map(ToString::to_string)
            .collect(),
    })
}

#[derive(Debug, Serialize)]
pub struct ClipboardResponse {
    pub success: bool,
    pub message: String,
}

/// Inject the current clipboard text into the conversation context
pub async fn clipboard(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Json<ClipboardResponse>, ApiError> {
    let content = tokio::task::spawn_blocking(clipboard::read_text)
        .await
        .map_err(|e| ApiError::Internal(format!("clipboard task failed: {e}")))??;

    let id = session_id(&headers);
    let session = state.sessions.lock().await.get_or_create(&id);
    session
        .lock()
        .await
        .inject_context(&clipboard::context_block(&content))?;

    Ok(Json(ClipboardResponse {
        success: true,
        message: "Clipboard content added to context".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LeetCodeRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeetCodeResponse {
    pub success: bool,
    pub problem: Problem,
    pub initial_response: String,
}

/// Scrape a problem, seed it as context, and open the interview
pub async fn leetcode(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(request): Json<LeetCodeRequest>,
) -> Result<Json<LeetCodeResponse>, ApiError> {
    let url = request
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No URL provided".to_string()))?;

    // Invalid references are rejected before any network call
    let slug = scrape::extract_slug(&url)
        .ok_or_else(|| ApiError::BadRequest("Invalid LeetCode URL".to_string()))?;

    let problem = state.scraper.fetch_problem(&slug).await?;
    problem.save_to_file(&state.problem_dump_path)?;

    let id = session_id(&headers);
    let session = state.sessions.lock().await.get_or_create(&id);
    let mut session = session.lock().await;

    session.inject_context(&problem.dump())?;
    session.record_user_turn(INTRO_PROMPT);
    let initial_response = session.request_assistant_reply(state.chat.as_ref()).await?;

    Ok(Json(LeetCodeResponse {
        success: true,
        problem,
        initial_response,
    }))
}
