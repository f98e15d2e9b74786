//! Spoken questions
//!
//! A [`SpeechRecognizer`] captures one utterance per `start` call and reports
//! exactly one [`VoiceEvent`] on the channel it was given. Each capture gets a
//! fresh channel, so events from a cancelled capture have nowhere to land.

use crate::config::VoiceConfig;
use crate::{Result, TarotError};
use crossbeam_channel::Sender;
use tracing::{info, warn};

/// Outcome of one capture
#[derive(Clone, Debug)]
pub enum VoiceEvent {
    /// First recognized utterance
    Transcript(String),
    /// Capture ended without a usable transcript
    Error(TarotError),
}

/// Single-shot speech recognition
pub trait SpeechRecognizer: Send {
    /// Begin capturing; the result arrives on `events`
    ///
    /// An `Err` means the capture never started and no event will follow.
    fn start(&mut self, locale: &str, events: Sender<VoiceEvent>) -> Result<()>;

    /// Abandon the running capture, if any
    fn cancel(&mut self);

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Recognizer used when no audio backend is available
pub struct UnavailableRecognizer {
    reason: String,
}

impl UnavailableRecognizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SpeechRecognizer for UnavailableRecognizer {
    fn start(&mut self, _locale: &str, _events: Sender<VoiceEvent>) -> Result<()> {
        Err(TarotError::AudioDeviceError(self.reason.clone()))
    }

    fn cancel(&mut self) {}

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Decision after one VAD window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// Keep listening
    Continue,
    /// Speech was heard and has ended
    Utterance,
    /// Time ran out before any speech
    NoSpeech,
}

/// Finds the end of a single utterance from per-window speech decisions
///
/// An utterance ends after `silence_secs` of non-speech following speech, or
/// when `max_secs` of audio have been seen.
#[derive(Clone, Debug)]
pub struct Endpointer {
    window_secs: f32,
    silence_secs: f32,
    max_secs: f32,
    elapsed: f32,
    trailing_silence: f32,
    heard_speech: bool,
}

impl Endpointer {
    pub fn new(window_secs: f32, silence_secs: f32, max_secs: f32) -> Self {
        Self {
            window_secs,
            silence_secs,
            max_secs,
            elapsed: 0.0,
            trailing_silence: 0.0,
            heard_speech: false,
        }
    }

    pub fn from_config(window_secs: f32, config: &VoiceConfig) -> Self {
        Self::new(window_secs, config.silence_secs, config.max_duration_secs)
    }

    pub fn push(&mut self, is_speech: bool) -> Endpoint {
        self.elapsed += self.window_secs;
        if is_speech {
            self.heard_speech = true;
            self.trailing_silence = 0.0;
        } else if self.heard_speech {
            self.trailing_silence += self.window_secs;
        }

        if self.heard_speech && self.trailing_silence >= self.silence_secs {
            Endpoint::Utterance
        } else if self.elapsed >= self.max_secs {
            if self.heard_speech {
                Endpoint::Utterance
            } else {
                Endpoint::NoSpeech
            }
        } else {
            Endpoint::Continue
        }
    }

    pub fn heard_speech(&self) -> bool {
        self.heard_speech
    }
}

/// Pick the best recognizer this build and configuration allow
#[cfg(feature = "audio-io")]
pub fn recognizer_for(config: &VoiceConfig) -> Box<dyn SpeechRecognizer> {
    match super::whisper::WhisperRecognizer::new(config.clone()) {
        Ok(recognizer) => {
            info!("[VOICE] Using Whisper recognizer ({})", config.locale);
            Box::new(recognizer)
        }
        Err(e) => {
            warn!("[VOICE] Whisper unavailable: {}", e);
            Box::new(UnavailableRecognizer::new(e.to_string()))
        }
    }
}

/// Pick the best recognizer this build and configuration allow
#[cfg(not(feature = "audio-io"))]
pub fn recognizer_for(_config: &VoiceConfig) -> Box<dyn SpeechRecognizer> {
    warn!("[VOICE] Built without audio-io, voice input disabled");
    info!("[VOICE] Questions can still be typed");
    Box::new(UnavailableRecognizer::new(
        "built without the audio-io feature",
    ))
}
