//! Interview Coach - voice-driven mock interview assistant
//!
//! Records a candidate's spoken answer, transcribes it, forwards it to a
//! language model playing an interviewer persona, and speaks the reply back.
//! A scraper seeds a coding-problem statement as conversation context.
//!
//! # Architecture
//!
//! ```text
//! mic ──▶ capture ──▶ STT ─┐
//!                          ▼
//!               conversation session ──▶ chat API
//!              (history + reply cache)      │
//!                          ▲                ▼
//!   problem scrape ────────┘     TTS ──▶ playback
//!   clipboard ─────────────┘       └───▶ transcript log
//! ```
//!
//! The conversation session is the only stateful piece: a bounded message
//! history with a pinned persona prompt and a bounded FIFO cache of recent
//! replies. Everything else is a thin client over an external collaborator.

pub mod api;
pub mod chat;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod scrape;
pub mod session;
pub mod transcript;
pub mod voice;

pub use chat::{ChatBackend, ChatClient};
pub use config::Config;
pub use error::{Error, Result};
pub use scrape::{LeetCodeClient, Problem};
pub use session::{Message, Role, Session, SessionStore};
pub use transcript::TranscriptLog;
