//! UI components and application module
//!
//! This module provides the egui/eframe-based user interface for MyTarot.

mod app;
pub mod assets;
pub mod components;
mod theme;

pub use app::{
    ExitCode, TarotApp, COMPLETE_LABEL, RESTART_LABEL, RESULT_HEADING, RETRY_LABEL,
    SELECT_HEADING, START_LABEL, SUBMIT_LABEL, TITLE,
};
pub use assets::AssetCatalog;
pub use components::{CardTile, ReadingDisplay, VoiceButton};
pub use theme::{find_hangul_font, install_fonts, Theme, BUNDLED_FONT};
