//! Interpretation panel for the reading screen
//!
//! Scrollable, wrapped text with the time the reading arrived.

use crate::ui::theme::Theme;
use chrono::{DateTime, Local, Utc};
use egui::{Frame, Margin, RichText, ScrollArea, Ui};

pub struct ReadingDisplay<'a> {
    text: &'a str,
    received_at: Option<DateTime<Utc>>,
    theme: &'a Theme,
    max_height: f32,
}

impl<'a> ReadingDisplay<'a> {
    pub fn new(text: &'a str, received_at: Option<DateTime<Utc>>, theme: &'a Theme) -> Self {
        Self {
            text,
            received_at,
            theme,
            max_height: 280.0,
        }
    }

    /// Set the maximum height for the scrollable area
    pub fn max_height(mut self, height: f32) -> Self {
        self.max_height = height;
        self
    }

    pub fn show(&self, ui: &mut Ui) {
        Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(Margin::same(self.theme.spacing))
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .max_height(self.max_height)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        ui.add(
                            egui::Label::new(
                                RichText::new(self.text)
                                    .size(16.0)
                                    .color(self.theme.text_primary),
                            )
                            .wrap(),
                        );
                    });

                if let Some(received_at) = self.received_at {
                    ui.add_space(self.theme.spacing_sm);
                    ui.label(
                        RichText::new(format!("받은 시각: {}", format_timestamp(received_at)))
                            .size(12.0)
                            .color(self.theme.text_muted),
                    );
                }
            });
    }
}

/// Local wall-clock time of a reading
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
