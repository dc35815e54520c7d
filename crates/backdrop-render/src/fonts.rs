//! Font discovery and TrueType/OpenType glyph sources.
//!
//! Uses fontdb to find faces by family and weight, and ttf-parser to read
//! metrics and outlines.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use tiny_skia::PathBuilder;
use ttf_parser::{Face, GlyphId, OutlineBuilder};

use crate::error::{RenderError, Result};
use crate::text::{BoxGlyphs, GlyphSource, VerticalMetrics};

/// A parsed font face. Keeps the raw data and re-parses the table
/// directory on use, which is cheap.
#[derive(Debug, Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    index: u32,
    units_per_em: f32,
    ascender: f32,
    descender: f32,
}

impl FontFace {
    pub fn from_data(data: Vec<u8>, index: u32) -> Result<Self> {
        let face = Face::parse(&data, index).map_err(|e| RenderError::Font(e.to_string()))?;
        let units_per_em = f32::from(face.units_per_em());
        let ascender = f32::from(face.ascender());
        let descender = f32::from(face.descender());
        Ok(Self {
            data: Arc::new(data),
            index,
            units_per_em,
            ascender,
            descender,
        })
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.index).ok()
    }

    fn scale(&self, font_size: f32) -> f32 {
        font_size / self.units_per_em
    }

    /// Falls back to `.notdef` for characters the face lacks.
    fn glyph(face: &Face<'_>, ch: char) -> GlyphId {
        face.glyph_index(ch).unwrap_or(GlyphId(0))
    }
}

impl GlyphSource for FontFace {
    fn advance(&self, ch: char, font_size: f32) -> f32 {
        let Some(face) = self.face() else {
            return 0.0;
        };
        let advance = face
            .glyph_hor_advance(Self::glyph(&face, ch))
            .unwrap_or(0);
        f32::from(advance) * self.scale(font_size)
    }

    fn vertical_metrics(&self, font_size: f32) -> VerticalMetrics {
        let scale = self.scale(font_size);
        VerticalMetrics {
            ascent: self.ascender * scale,
            descent: self.descender * scale,
        }
    }

    fn outline(
        &self,
        ch: char,
        font_size: f32,
        x: f32,
        baseline: f32,
        builder: &mut PathBuilder,
    ) -> bool {
        let Some(face) = self.face() else {
            return false;
        };
        let mut converter = PathConverter {
            builder,
            scale: self.scale(font_size),
            x,
            y: baseline,
        };
        face.outline_glyph(Self::glyph(&face, ch), &mut converter)
            .is_some()
    }
}

/// Feeds font-unit outlines into a y-down path builder.
struct PathConverter<'a> {
    builder: &'a mut PathBuilder,
    scale: f32,
    x: f32,
    y: f32,
}

impl OutlineBuilder for PathConverter<'_> {
    fn move_to(&mut self, px: f32, py: f32) {
        self.builder
            .move_to(self.x + px * self.scale, self.y - py * self.scale);
    }

    fn line_to(&mut self, px: f32, py: f32) {
        self.builder
            .line_to(self.x + px * self.scale, self.y - py * self.scale);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, px: f32, py: f32) {
        self.builder.quad_to(
            self.x + x1 * self.scale,
            self.y - y1 * self.scale,
            self.x + px * self.scale,
            self.y - py * self.scale,
        );
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, px: f32, py: f32) {
        self.builder.cubic_to(
            self.x + x1 * self.scale,
            self.y - y1 * self.scale,
            self.x + x2 * self.scale,
            self.y - y2 * self.scale,
            self.x + px * self.scale,
            self.y - py * self.scale,
        );
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Resolves `(family, weight)` pairs to glyph sources, with caching.
///
/// Lookup order: the requested family, the configured fallback family, the
/// generic sans-serif family, and finally [`BoxGlyphs`].
pub struct FontBook {
    db: Database,
    fallback_family: String,
    cache: RefCell<HashMap<(String, u16), Arc<dyn GlyphSource>>>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.db.len())
            .field("fallback_family", &self.fallback_family)
            .finish()
    }
}

impl FontBook {
    /// An empty book: every family resolves to box glyphs until fonts are
    /// loaded.
    pub fn new(fallback_family: &str) -> Self {
        Self {
            db: Database::new(),
            fallback_family: fallback_family.to_string(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_system_fonts(fallback_family: &str) -> Self {
        let mut book = Self::new(fallback_family);
        book.db.load_system_fonts();
        log::info!("Loaded {} system font faces", book.db.len());
        book
    }

    pub fn load_fonts_dir(&mut self, dir: &Path) {
        let before = self.db.len();
        self.db.load_fonts_dir(dir);
        log::info!(
            "Loaded {} font faces from {}",
            self.db.len() - before,
            dir.display()
        );
        self.cache.borrow_mut().clear();
    }

    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.db.load_font_data(data);
        self.cache.borrow_mut().clear();
    }

    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    pub fn fallback_family(&self) -> &str {
        &self.fallback_family
    }

    /// Always yields something drawable.
    pub fn resolve(&self, family: &str, weight: u16) -> Arc<dyn GlyphSource> {
        let key = (family.to_string(), weight);
        if let Some(source) = self.cache.borrow().get(&key) {
            return Arc::clone(source);
        }

        let source = self.lookup(family, weight);
        self.cache.borrow_mut().insert(key, Arc::clone(&source));
        source
    }

    fn lookup(&self, family: &str, weight: u16) -> Arc<dyn GlyphSource> {
        let candidates = [
            Family::Name(family),
            Family::Name(&self.fallback_family),
            Family::SansSerif,
        ];

        for (i, candidate) in candidates.iter().enumerate() {
            let query = Query {
                families: std::slice::from_ref(candidate),
                weight: Weight(weight),
                stretch: Stretch::Normal,
                style: Style::Normal,
            };
            let Some(id) = self.db.query(&query) else {
                continue;
            };
            let loaded = self
                .db
                .with_face_data(id, |data, index| FontFace::from_data(data.to_vec(), index));
            match loaded {
                Some(Ok(face)) => {
                    if i > 0 {
                        log::warn!(
                            "Font '{}' ({}) not installed, using fallback {:?}",
                            family,
                            weight,
                            candidate
                        );
                    }
                    return Arc::new(face);
                }
                Some(Err(e)) => log::warn!("Skipping unreadable face for {:?}: {}", candidate, e),
                None => log::warn!("Font source for {:?} disappeared", candidate),
            }
        }

        log::warn!("No font available for '{}', drawing box glyphs", family);
        Arc::new(BoxGlyphs)
    }
}
