//! MyTarot - three-card tarot readings with spoken or typed questions
//!
//! This crate provides the reading session state machine, the 78-card deck,
//! an interpretation client for a chat-completions API, optional on-device
//! speech recognition, and an egui front end.

#[cfg(feature = "audio-io")]
pub mod audio;
pub mod config;
pub mod deck;
pub mod error;
pub mod processor;
pub mod state;
pub mod testconfig;
pub mod ui;

// Re-export error types
pub use error::{Result, TarotError};

// Re-export the types most callers need
pub use config::TarotConfig;
pub use deck::{deck, CardDescriptor, Deck};
pub use processor::SessionController;
pub use state::{
    Effect, InterpretationRequest, Notice, Phase, RequestState, Selection, SessionAction,
    SessionState, SharedSession,
};
