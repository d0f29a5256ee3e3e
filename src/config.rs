//! Configuration for the interview coach

use std::path::PathBuf;

use crate::{Error, Result};

/// Default interviewer persona compiled into the binary
const EMBEDDED_PERSONA: &str = include_str!("../personas/interviewer.txt");

/// Interview coach configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// The interviewer persona prompt (history message 0)
    pub persona_prompt: String,

    /// API keys for external services
    pub api_keys: ApiKeys,

    /// Chat completion settings
    pub chat: ChatConfig,

    /// Voice settings
    pub voice: VoiceConfig,

    /// HTTP API port
    pub port: u16,

    /// Append-only interview transcript path
    pub transcript_path: PathBuf,

    /// Plain-text problem dump path, overwritten on each scrape
    pub problem_dump_path: PathBuf,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `DeepSeek` API key (chat completions)
    pub deepseek: Option<String>,

    /// `OpenAI` API key (Whisper transcription and TTS)
    pub openai: Option<String>,
}

/// Chat completion settings
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of the OpenAI-compatible endpoint
    pub base_url: String,

    /// Model identifier
    pub model: String,
}

/// Voice processing settings
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Enable voice input/output (off on headless hosts)
    pub enabled: bool,

    /// Transcription model (e.g. "whisper-1")
    pub stt_model: String,

    /// Synthesis model (e.g. "tts-1")
    pub tts_model: String,

    /// Synthesis voice identifier
    pub tts_voice: String,

    /// Synthesis speed multiplier
    pub tts_speed: f32,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// # Errors
    ///
    /// Returns error if a persona override file is configured but unreadable.
    pub fn load() -> Result<Self> {
        Self::load_with_options(false)
    }

    /// Load configuration with an explicit voice disable option
    ///
    /// # Errors
    ///
    /// Returns error if a persona override file is configured but unreadable.
    pub fn load_with_options(disable_voice: bool) -> Result<Self> {
        let persona_prompt = Self::load_persona_prompt()?;

        let api_keys = ApiKeys {
            deepseek: std::env::var("DEEPSEEK_API_KEY").ok(),
            openai: std::env::var("OPENAI_API_KEY").ok(),
        };

        let chat = ChatConfig {
            base_url: std::env::var("DEEPSEEK_BASE_URL")
                .unwrap_or_else(|_| crate::chat::DEFAULT_BASE_URL.to_string()),
            model: std::env::var("INTERVIEW_LLM_MODEL")
                .unwrap_or_else(|_| crate::chat::DEFAULT_MODEL.to_string()),
        };

        let voice = VoiceConfig {
            enabled: !disable_voice,
            stt_model: std::env::var("INTERVIEW_STT_MODEL")
                .unwrap_or_else(|_| "whisper-1".to_string()),
            tts_model: std::env::var("INTERVIEW_TTS_MODEL")
                .unwrap_or_else(|_| "tts-1".to_string()),
            tts_voice: std::env::var("INTERVIEW_TTS_VOICE")
                .unwrap_or_else(|_| "alloy".to_string()),
            tts_speed: std::env::var("INTERVIEW_TTS_SPEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        };

        if disable_voice {
            tracing::info!("voice explicitly disabled");
        }

        let port = std::env::var("INTERVIEW_API_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        let transcript_path = std::env::var("INTERVIEW_LOG_PATH")
            .map_or_else(|_| PathBuf::from("interview_log.txt"), PathBuf::from);

        let problem_dump_path = std::env::var("INTERVIEW_PROBLEM_DUMP")
            .map_or_else(|_| PathBuf::from("scraped_problems.txt"), PathBuf::from);

        Ok(Self {
            persona_prompt,
            api_keys,
            chat,
            voice,
            port,
            transcript_path,
            problem_dump_path,
        })
    }

    /// Load the persona prompt, preferring an override file over the
    /// embedded default
    fn load_persona_prompt() -> Result<String> {
        if let Ok(path) = std::env::var("INTERVIEW_PROMPT_PATH") {
            let prompt = std::fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("failed to read persona prompt from {path}: {e}"))
            })?;
            tracing::info!(path, "loaded persona prompt override");
            return Ok(prompt);
        }

        Ok(EMBEDDED_PERSONA.to_string())
    }

    /// The embedded default persona prompt
    #[must_use]
    pub fn embedded_persona() -> &'static str {
        EMBEDDED_PERSONA
    }
}
