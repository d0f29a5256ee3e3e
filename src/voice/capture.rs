//! Microphone capture and utterance segmentation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Sample rate for capture (16kHz mono, what the transcription API expects)
pub const SAMPLE_RATE: u32 = 16_000;

/// RMS energy above which a chunk counts as speech
const SPEECH_RMS_THRESHOLD: f32 = 0.02;

/// Minimum speech length for a valid utterance (0.3s)
const MIN_SPEECH_SAMPLES: usize = SAMPLE_RATE as usize * 3 / 10;

/// Trailing silence that ends an utterance (0.8s)
const TRAILING_SILENCE_SAMPLES: usize = SAMPLE_RATE as usize * 4 / 5;

/// Poll interval while recording
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captures audio from the default input device into a shared buffer
pub struct AudioCapture {
    config: StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    stream: Option<Stream>,
}

impl AudioCapture {
    /// Open the default input device at 16kHz mono
    ///
    /// # Errors
    ///
    /// Returns error if no input device or suitable configuration exists.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no mono 16kHz input config found".to_string()))?
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "audio capture initialized"
        );

        Ok(Self {
            config,
            buffer: Arc::new(Mutex::new(Vec::new())),
            stream: None,
        })
    }

    /// Begin streaming microphone input into the buffer
    ///
    /// # Errors
    ///
    /// Returns error if the input stream cannot be built or started.
    pub fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device".to_string()))?;

        let buffer = Arc::clone(&self.buffer);
        let stream = device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| tracing::error!(error = %err, "audio capture error"),
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        self.stream = Some(stream);
        tracing::debug!("audio capture started");
        Ok(())
    }

    /// Stop capturing
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("audio capture stopped");
        }
    }

    /// Take everything captured since the last drain
    #[must_use]
    pub fn drain(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Captured samples without draining (for level meters)
    #[must_use]
    pub fn peek(&self) -> Vec<f32> {
        match self.buffer.lock() {
            Ok(buf) => buf.clone(),
            Err(_) => Vec::new(),
        }
    }

    /// Whether a stream is currently running
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.stream.is_some()
    }
}

/// Segments one spoken answer out of a capture stream
///
/// Recording starts when sustained speech energy appears and ends after a
/// stretch of trailing silence. Leading silence is discarded.
#[derive(Debug, Default)]
pub struct TurnRecorder {
    samples: Vec<f32>,
    speech_samples: usize,
    started: bool,
    silence_run: usize,
}

impl TurnRecorder {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of captured samples
    ///
    /// Returns `true` once the utterance is complete (enough speech followed
    /// by trailing silence).
    pub fn push(&mut self, chunk: &[f32]) -> bool {
        if chunk.is_empty() {
            return false;
        }

        let is_speech = rms(chunk) > SPEECH_RMS_THRESHOLD;

        if !self.started {
            if is_speech {
                self.started = true;
                self.samples.extend_from_slice(chunk);
                self.speech_samples = chunk.len();
                self.silence_run = 0;
                tracing::trace!("speech started");
            }
            return false;
        }

        self.samples.extend_from_slice(chunk);
        if is_speech {
            self.speech_samples += chunk.len();
            self.silence_run = 0;
        } else {
            self.silence_run += chunk.len();
        }

        self.is_complete()
    }

    /// Whether a full utterance has been captured
    ///
    /// Only samples from speech chunks count toward the minimum; trailing
    /// silence never qualifies a blip as a full utterance.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.started
            && self.silence_run >= TRAILING_SILENCE_SAMPLES
            && self.speech_samples >= MIN_SPEECH_SAMPLES
    }

    /// Whether any speech has been detected yet
    #[must_use]
    pub const fn has_speech(&self) -> bool {
        self.started
    }

    /// Take the captured samples, resetting the recorder
    pub fn take(&mut self) -> Vec<f32> {
        self.started = false;
        self.speech_samples = 0;
        self.silence_run = 0;
        std::mem::take(&mut self.samples)
    }
}

/// Record one spoken answer from the default microphone
///
/// Blocks until the utterance completes, `max_duration` elapses, or `cancel`
/// is raised. Cancellation and a turn with no detected speech both yield
/// `Ok(None)` — the defined "no input" outcome, never an error. Callers must
/// treat `None` as an empty turn and record nothing.
///
/// # Errors
///
/// Returns error if the audio device cannot be opened or started.
pub fn record_utterance(
    cancel: &AtomicBool,
    max_duration: Duration,
) -> Result<Option<Vec<f32>>> {
    let mut capture = AudioCapture::new()?;
    capture.start()?;

    let mut recorder = TurnRecorder::new();
    let started = Instant::now();

    let outcome = loop {
        if cancel.load(Ordering::Relaxed) {
            tracing::info!("recording cancelled");
            break None;
        }

        std::thread::sleep(POLL_INTERVAL);
        let chunk = capture.drain();
        if recorder.push(&chunk) {
            break Some(recorder.take());
        }

        if started.elapsed() >= max_duration {
            tracing::debug!("recording hit max duration");
            break recorder.has_speech().then(|| recorder.take());
        }
    };

    capture.stop();
    Ok(outcome.filter(|samples| !samples.is_empty()))
}

/// RMS energy of a sample chunk
#[allow(clippy::cast_precision_loss)]
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Encode f32 samples as 16-bit PCM WAV bytes for the transcription API
///
/// # Errors
///
/// Returns error if WAV encoding fails.
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;
        for &sample in samples {
            #[allow(clippy::cast_possible_truncation)]
            let pcm = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(pcm)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }
        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
