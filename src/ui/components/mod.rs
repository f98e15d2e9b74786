//! UI components module
//!
//! Reusable widgets for the MyTarot screens.

pub mod card_tile;
pub mod reading_display;
pub mod voice_button;

pub use card_tile::{CardTile, GRID_CARD_SIZE, READING_CARD_SIZE};
pub use reading_display::ReadingDisplay;
pub use voice_button::{VoiceButton, VOICE_IDLE_LABEL, VOICE_LISTENING_LABEL};
