//! Microphone capture for spoken questions
//!
//! Only compiled with the `audio-io` feature.

pub mod input;
pub mod resampler;
pub mod vad;

pub use input::Microphone;
pub use resampler::StreamResampler;
pub use vad::SpeechDetector;

/// Sample rate Whisper and the VAD expect
pub const SPEECH_SAMPLE_RATE: u32 = 16_000;
