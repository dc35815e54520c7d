use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backdrop_core::DEFAULT_REFERENCE_PREVIEW_HEIGHT;
use backdrop_render::FontBook;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Editor settings. Every field has a default, so a partial (or empty) JSON
/// object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Height of the preview container the background is laid out in.
    pub reference_preview_height: f64,
    /// Quiet period after the last attribute edit before it is saved.
    pub save_quiescence_ms: u64,
    pub export_file_name: String,
    pub font_dirs: Vec<PathBuf>,
    pub load_system_fonts: bool,
    pub fallback_family: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            reference_preview_height: DEFAULT_REFERENCE_PREVIEW_HEIGHT,
            save_quiescence_ms: 300,
            export_file_name: "text-behind-image.png".to_string(),
            font_dirs: Vec::new(),
            load_system_fonts: true,
            fallback_family: "Inter".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save_quiescence(&self) -> Duration {
        Duration::from_millis(self.save_quiescence_ms)
    }

    /// Font book with the configured system and directory fonts loaded.
    pub fn font_book(&self) -> FontBook {
        let mut fonts = if self.load_system_fonts {
            FontBook::with_system_fonts(&self.fallback_family)
        } else {
            FontBook::new(&self.fallback_family)
        };
        for dir in &self.font_dirs {
            fonts.load_fonts_dir(dir);
        }
        fonts
    }
}
