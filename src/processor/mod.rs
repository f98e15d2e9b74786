//! Background work for a reading session
//!
//! This module contains the pieces that run off the UI thread:
//! - Interpretation requests against the chat-completions API
//! - Spoken-question capture
//! - The controller that ties both to the session state

pub mod controller;
pub mod oracle;
pub mod voice;
#[cfg(feature = "audio-io")]
pub mod whisper;

// Re-export commonly used types
pub use controller::SessionController;
pub use oracle::{
    build_prompt, ChatClient, ChatMessage, ChatRequest, OracleCommand, OracleEvent, OracleHandle,
    OracleRunner, Role, SYSTEM_PERSONA,
};
pub use voice::{
    recognizer_for, Endpoint, Endpointer, SpeechRecognizer, UnavailableRecognizer, VoiceEvent,
};
#[cfg(feature = "audio-io")]
pub use whisper::WhisperRecognizer;
