//! Card artwork lookup
//!
//! Image references are resolved against the assets directory once at
//! startup. Missing files map to `None` and the card is painted instead.

use crate::config::UiConfig;
use crate::deck::{deck, CardDescriptor, BACK_IMAGE, INTRO_VIDEO};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// `file://` URIs for the artwork that exists on disk
#[derive(Clone, Debug, Default)]
pub struct AssetCatalog {
    back: Option<String>,
    fronts: HashMap<String, String>,
    has_intro_video: bool,
}

impl AssetCatalog {
    /// Look for every card image under the configured directory
    pub fn scan(config: &UiConfig) -> Self {
        let resolve = |relative: &str| {
            let path = config.asset_path(relative);
            path.is_file().then(|| file_uri(&path))
        };

        let back = resolve(BACK_IMAGE);
        let fronts: HashMap<String, String> = deck()
            .cards()
            .iter()
            .filter_map(|card| resolve(&card.front_image).map(|uri| (card.id.clone(), uri)))
            .collect();
        let has_intro_video = config.asset_path(INTRO_VIDEO).is_file();

        info!(
            "Assets in {:?}: back image {}, {} of {} card faces",
            config.assets_dir,
            if back.is_some() { "found" } else { "missing" },
            fronts.len(),
            deck().len()
        );
        if back.is_none() || fronts.len() < deck().len() {
            warn!("Missing card artwork will be painted");
        }
        if has_intro_video {
            debug!("Intro video present; the welcome screen uses an animated title instead");
        }

        Self {
            back,
            fronts,
            has_intro_video,
        }
    }

    /// Catalog with no artwork at all
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn back(&self) -> Option<&str> {
        self.back.as_deref()
    }

    pub fn front(&self, card: &CardDescriptor) -> Option<&str> {
        self.fronts.get(&card.id).map(String::as_str)
    }

    pub fn has_intro_video(&self) -> bool {
        self.has_intro_video
    }
}

fn file_uri(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}
