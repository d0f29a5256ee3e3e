//! Voice pipeline: capture, transcription, synthesis, playback

pub mod capture;
pub mod playback;
pub mod stt;
pub mod tts;

pub use capture::{record_utterance, samples_to_wav, AudioCapture, TurnRecorder, SAMPLE_RATE};
pub use playback::AudioPlayback;
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
