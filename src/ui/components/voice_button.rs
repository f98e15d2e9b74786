//! Voice question button
//!
//! Shows a pulsing dot and a disabled "recording" label while a capture runs.

use crate::ui::theme::Theme;
use egui::{Button, Color32, Response, RichText, Ui, Vec2, WidgetInfo, WidgetType};

pub const VOICE_IDLE_LABEL: &str = "음성으로 질문하기";
pub const VOICE_LISTENING_LABEL: &str = "녹음 중...";

pub struct VoiceButton<'a> {
    listening: bool,
    theme: &'a Theme,
}

impl<'a> VoiceButton<'a> {
    pub fn new(listening: bool, theme: &'a Theme) -> Self {
        Self { listening, theme }
    }

    pub fn show(self, ui: &mut Ui) -> Response {
        let (label, fill) = if self.listening {
            (VOICE_LISTENING_LABEL, self.theme.listening)
        } else {
            (VOICE_IDLE_LABEL, self.theme.secondary)
        };

        let button = Button::new(RichText::new(format!("🎤 {}", label)).color(Color32::WHITE))
            .fill(fill)
            .rounding(self.theme.button_rounding)
            .min_size(Vec2::new(180.0, 40.0));

        let response = ui.add_enabled(!self.listening, button);
        response.widget_info(|| WidgetInfo::labeled(WidgetType::Button, !self.listening, label));

        if self.listening {
            self.draw_pulse(ui, &response);
        }

        response
    }

    fn draw_pulse(&self, ui: &Ui, response: &Response) {
        let t = ui.ctx().input(|i| i.time);
        let pulse = ((t * 4.0).sin() * 0.5 + 0.5) as f32;
        let center = response.rect.right_center() + Vec2::new(12.0, 0.0);
        ui.painter().circle_filled(
            center,
            4.0 + pulse * 2.0,
            self.theme.listening.gamma_multiply(0.4 + pulse * 0.6),
        );
        ui.ctx().request_repaint();
    }
}
