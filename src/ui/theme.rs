//! Theme and styling for the MyTarot UI
//!
//! Deep purple and indigo backgrounds with a gold accent for picked cards.

use crate::config::{ThemeMode, UiConfig};
use egui::{Color32, FontData, FontDefinitions, FontFamily, FontId, Rounding, Stroke, Vec2, Visuals};
use std::path::PathBuf;
use tracing::{info, warn};

/// Application theme configuration
#[derive(Clone, Debug)]
pub struct Theme {
    /// Buttons and highlights
    pub primary: Color32,
    /// Secondary accent (purple)
    pub secondary: Color32,
    /// Border of picked cards
    pub accent: Color32,
    pub warning: Color32,
    pub error: Color32,

    pub bg_primary: Color32,
    pub bg_secondary: Color32,
    pub bg_tertiary: Color32,

    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,

    /// Face-down card fill
    pub card_back: Color32,
    /// Painted card face (when no image is available)
    pub card_face: Color32,
    /// Voice button while a capture runs
    pub listening: Color32,

    pub button_rounding: Rounding,
    pub card_rounding: Rounding,

    pub spacing: f32,
    pub spacing_lg: f32,
    pub spacing_sm: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn from_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    /// Night-sky purple
    pub fn dark() -> Self {
        Self {
            primary: Color32::from_rgb(99, 102, 241),   // Indigo
            secondary: Color32::from_rgb(139, 92, 246), // Purple
            accent: Color32::from_rgb(250, 204, 21),    // Gold
            warning: Color32::from_rgb(234, 179, 8),
            error: Color32::from_rgb(239, 68, 68),

            bg_primary: Color32::from_rgb(30, 16, 56),   // Deep purple
            bg_secondary: Color32::from_rgb(46, 26, 84), // Violet
            bg_tertiary: Color32::from_rgb(49, 46, 129), // Indigo

            text_primary: Color32::from_rgb(250, 245, 255),
            text_secondary: Color32::from_rgb(221, 214, 254),
            text_muted: Color32::from_rgb(167, 139, 250),

            card_back: Color32::from_rgb(67, 56, 202),
            card_face: Color32::from_rgb(253, 246, 227),
            listening: Color32::from_rgb(239, 68, 68),

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(6.0),

            spacing: 16.0,
            spacing_lg: 24.0,
            spacing_sm: 8.0,
        }
    }

    /// Lavender paper
    pub fn light() -> Self {
        Self {
            primary: Color32::from_rgb(79, 70, 229),
            secondary: Color32::from_rgb(124, 58, 237),
            accent: Color32::from_rgb(202, 138, 4),
            warning: Color32::from_rgb(202, 138, 4),
            error: Color32::from_rgb(220, 38, 38),

            bg_primary: Color32::from_rgb(245, 243, 255),
            bg_secondary: Color32::from_rgb(237, 233, 254),
            bg_tertiary: Color32::from_rgb(221, 214, 254),

            text_primary: Color32::from_rgb(46, 16, 101),
            text_secondary: Color32::from_rgb(76, 29, 149),
            text_muted: Color32::from_rgb(109, 40, 217),

            card_back: Color32::from_rgb(99, 102, 241),
            card_face: Color32::from_rgb(255, 251, 235),
            listening: Color32::from_rgb(220, 38, 38),

            button_rounding: Rounding::same(8.0),
            card_rounding: Rounding::same(6.0),

            spacing: 16.0,
            spacing_lg: 24.0,
            spacing_sm: 8.0,
        }
    }

    /// Apply this theme to egui
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = if self.bg_primary.r() < 128 {
            Visuals::dark()
        } else {
            Visuals::light()
        };

        visuals.panel_fill = self.bg_primary;
        visuals.window_fill = self.bg_secondary;
        visuals.extreme_bg_color = self.bg_secondary;

        visuals.widgets.noninteractive.bg_fill = self.bg_secondary;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text_secondary);

        visuals.widgets.inactive.bg_fill = self.bg_tertiary;
        visuals.widgets.inactive.weak_bg_fill = self.bg_tertiary;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.widgets.hovered.bg_fill = self.primary.gamma_multiply(0.8);
        visuals.widgets.hovered.weak_bg_fill = self.primary.gamma_multiply(0.8);
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.widgets.active.bg_fill = self.primary;
        visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.text_primary);

        visuals.selection.bg_fill = self.secondary.gamma_multiply(0.4);
        visuals.selection.stroke = Stroke::new(1.0, self.secondary);

        visuals.window_rounding = self.card_rounding;

        ctx.set_visuals(visuals);

        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = Vec2::splat(self.spacing_sm);
        style.spacing.button_padding = Vec2::new(self.spacing, self.spacing_sm);

        style.text_styles.insert(
            egui::TextStyle::Heading,
            FontId::new(26.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Body,
            FontId::new(16.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            FontId::new(16.0, FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Small,
            FontId::new(12.0, FontFamily::Proportional),
        );

        ctx.set_style(style);
    }

    /// Stroke for the picked-card highlight
    pub fn selected_stroke(&self) -> Stroke {
        Stroke::new(3.0, self.accent)
    }
}

/// Font file looked for under the assets directory
pub const BUNDLED_FONT: &str = "fonts/NotoSansKR-Regular.ttf";

/// Common system fonts with Hangul glyphs
const SYSTEM_HANGUL_FONTS: &[&str] = &[
    // Linux
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
    // macOS
    "/System/Library/Fonts/AppleSDGothicNeo.ttc",
    "/Library/Fonts/AppleGothic.ttf",
    // Windows
    "C:\\Windows\\Fonts\\malgun.ttf",
];

/// Pick the first font that exists: configured, bundled, then system
pub fn find_hangul_font(config: &UiConfig) -> Option<PathBuf> {
    let bundled = config.asset_path(BUNDLED_FONT);
    config
        .font_path
        .iter()
        .cloned()
        .chain(std::iter::once(bundled))
        .chain(SYSTEM_HANGUL_FONTS.iter().map(PathBuf::from))
        .find(|path| path.is_file())
}

/// Install a Hangul-capable font ahead of egui's defaults
///
/// egui's bundled fonts have no Hangul glyphs. Without a font the UI still
/// works but Korean text renders as boxes.
pub fn install_fonts(ctx: &egui::Context, config: &UiConfig) {
    let mut fonts = FontDefinitions::default();

    if let Some(configured) = &config.font_path {
        if !configured.is_file() {
            warn!("Configured font {:?} not found, looking elsewhere", configured);
        }
    }

    match find_hangul_font(config) {
        Some(path) => match std::fs::read(&path) {
            Ok(bytes) => {
                let name = "hangul".to_string();
                fonts
                    .font_data
                    .insert(name.clone(), FontData::from_owned(bytes).into());
                for family in [FontFamily::Proportional, FontFamily::Monospace] {
                    fonts.families.entry(family).or_default().insert(0, name.clone());
                }
                info!("Loaded font {:?}", path);
            }
            Err(e) => warn!("Failed to read font {:?}: {}", path, e),
        },
        None => warn!("No Hangul font found; set ui.font_path so Korean text renders"),
    }

    ctx.set_fonts(fonts);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_selects_palette() {
        let dark = Theme::from_mode(ThemeMode::Dark);
        let light = Theme::from_mode(ThemeMode::Light);
        assert!(dark.bg_primary.r() < 128);
        assert!(light.bg_primary.r() > 128);
    }

    #[test]
    fn test_missing_font_is_not_fatal() {
        let ctx = egui::Context::default();
        let mut config = UiConfig::default().with_assets_dir("/nonexistent/mytarot-assets");
        config.font_path = Some(PathBuf::from("/nonexistent/font.ttf"));
        install_fonts(&ctx, &config);
        Theme::dark().apply(&ctx);
    }

    #[test]
    fn test_bundled_font_found_without_configuration() {
        let dir = std::env::temp_dir().join(format!("mytarot-fonts-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("fonts")).unwrap();
        std::fs::write(dir.join(BUNDLED_FONT), b"ttf").unwrap();

        let config = UiConfig::default().with_assets_dir(&dir);
        assert!(config.font_path.is_none());
        assert_eq!(find_hangul_font(&config), Some(dir.join(BUNDLED_FONT)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_configured_font_wins() {
        let dir = std::env::temp_dir().join(format!("mytarot-font-pick-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("fonts")).unwrap();
        std::fs::write(dir.join(BUNDLED_FONT), b"ttf").unwrap();
        let own = dir.join("own.ttf");
        std::fs::write(&own, b"ttf").unwrap();

        let mut config = UiConfig::default().with_assets_dir(&dir);
        config.font_path = Some(own.clone());
        assert_eq!(find_hangul_font(&config), Some(own));

        // A missing configured font falls through to the bundled one
        config.font_path = Some(dir.join("missing.ttf"));
        assert_eq!(find_hangul_font(&config), Some(dir.join(BUNDLED_FONT)));

        std::fs::remove_dir_all(&dir).ok();
    }
}
