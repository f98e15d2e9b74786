//! A single tarot card in the selection grid or the reading

use crate::deck::CardDescriptor;
use crate::ui::theme::Theme;
use egui::{Align2, FontId, Image, Rect, Response, Sense, Stroke, Ui, Vec2, WidgetInfo, WidgetType};

/// Card size in the selection grid
pub const GRID_CARD_SIZE: Vec2 = Vec2::new(56.0, 92.0);
/// Card size on the reading screen
pub const READING_CARD_SIZE: Vec2 = Vec2::new(120.0, 198.0);

/// Clickable card, face down unless `face_up`
pub struct CardTile<'a> {
    card: &'a CardDescriptor,
    theme: &'a Theme,
    face_up: bool,
    highlighted: bool,
    size: Vec2,
    back_uri: Option<&'a str>,
    front_uri: Option<&'a str>,
}

impl<'a> CardTile<'a> {
    pub fn new(card: &'a CardDescriptor, theme: &'a Theme) -> Self {
        Self {
            card,
            theme,
            face_up: false,
            highlighted: false,
            size: GRID_CARD_SIZE,
            back_uri: None,
            front_uri: None,
        }
    }

    pub fn face_up(mut self, face_up: bool) -> Self {
        self.face_up = face_up;
        self
    }

    /// Draw the picked-card border
    pub fn highlighted(mut self, highlighted: bool) -> Self {
        self.highlighted = highlighted;
        self
    }

    pub fn size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    /// Artwork URIs; `None` paints the card instead
    pub fn images(mut self, back: Option<&'a str>, front: Option<&'a str>) -> Self {
        self.back_uri = back;
        self.front_uri = front;
        self
    }

    pub fn show(self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(self.size, Sense::click());

        let label = if self.face_up {
            self.card.name.to_string()
        } else {
            self.card.id.clone()
        };
        response.widget_info(|| {
            WidgetInfo::selected(WidgetType::Checkbox, true, self.highlighted, &label)
        });

        if ui.is_rect_visible(rect) {
            let rect = if response.hovered() && !self.face_up {
                rect.translate(Vec2::new(0.0, -3.0))
            } else {
                rect
            };

            let uri = if self.face_up {
                self.front_uri
            } else {
                self.back_uri
            };
            match uri {
                Some(uri) => {
                    Image::new(uri)
                        .rounding(self.theme.card_rounding)
                        .paint_at(ui, rect);
                }
                None if self.face_up => self.paint_face(ui, rect),
                None => self.paint_back(ui, rect),
            }

            if self.highlighted {
                ui.painter()
                    .rect_stroke(rect.expand(2.0), self.theme.card_rounding, self.theme.selected_stroke());
            }
        }

        response.on_hover_cursor(egui::CursorIcon::PointingHand)
    }

    fn paint_back(&self, ui: &Ui, rect: Rect) {
        let painter = ui.painter();
        painter.rect_filled(rect, self.theme.card_rounding, self.theme.card_back);
        painter.rect_stroke(
            rect.shrink(4.0),
            self.theme.card_rounding,
            Stroke::new(1.0, self.theme.accent.gamma_multiply(0.6)),
        );
        // A small star in the middle
        let center = rect.center();
        let radius = rect.width().min(rect.height()) * 0.18;
        painter.circle_stroke(center, radius, Stroke::new(1.5, self.theme.accent.gamma_multiply(0.8)));
        painter.circle_filled(center, radius * 0.35, self.theme.accent.gamma_multiply(0.8));
    }

    fn paint_face(&self, ui: &Ui, rect: Rect) {
        let painter = ui.painter();
        painter.rect_filled(rect, self.theme.card_rounding, self.theme.card_face);
        painter.rect_stroke(
            rect.shrink(3.0),
            self.theme.card_rounding,
            Stroke::new(1.0, self.theme.secondary),
        );

        let font_size = (rect.width() / 7.0).clamp(8.0, 16.0);
        let galley = painter.layout(
            self.card.name.to_string(),
            FontId::proportional(font_size),
            self.theme.bg_primary,
            rect.width() - 8.0,
        );
        let pos = rect.center() - galley.size() / 2.0;
        painter.galley(pos, galley, self.theme.bg_primary);

        painter.text(
            rect.center_bottom() - Vec2::new(0.0, 6.0),
            Align2::CENTER_BOTTOM,
            "✦",
            FontId::proportional(font_size),
            self.theme.secondary,
        );
    }
}
