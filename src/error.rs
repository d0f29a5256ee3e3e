//! Error types for the interview coach

use thiserror::Error;

/// Result type alias for interview coach operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the interview coach
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Chat completion error
    #[error("chat error: {0}")]
    Chat(String),

    /// Problem scraping error
    #[error("scrape error: {0}")]
    Scrape(String),

    /// Clipboard access error
    #[error("clipboard error: {0}")]
    Clipboard(String),

    /// Rejected before any external call (empty field, bad URL shape)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
