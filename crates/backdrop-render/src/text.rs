//! Glyph sources and centered single-line text layout.
//!
//! A text run is always centered on its local origin, both horizontally and
//! vertically. Without letter spacing the string is measured and outlined as
//! one run; with spacing every character is measured and placed on its own.

use backdrop_core::{BBox, Point};
use tiny_skia::{Path, PathBuilder, Rect};

/// Ascent above and descent below the baseline, in pixels. `descent` is
/// negative for glyphs that hang below the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalMetrics {
    pub ascent: f32,
    pub descent: f32,
}

impl VerticalMetrics {
    /// Baseline offset that puts the middle of the em box on `y = 0`.
    pub fn middle_baseline(&self) -> f32 {
        (self.ascent + self.descent) / 2.0
    }
}

/// Something that can measure and outline characters at a pixel size.
pub trait GlyphSource {
    /// Horizontal advance of `ch`.
    fn advance(&self, ch: char, font_size: f32) -> f32;

    fn vertical_metrics(&self, font_size: f32) -> VerticalMetrics;

    /// Append the outline of `ch` with its origin at `(x, baseline)`.
    /// Returns `false` when the character has no visible outline.
    fn outline(
        &self,
        ch: char,
        font_size: f32,
        x: f32,
        baseline: f32,
        builder: &mut PathBuilder,
    ) -> bool;

    /// Natural width of a whole string.
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        text.chars().map(|ch| self.advance(ch, font_size)).sum()
    }
}

/// Fallback glyphs drawn as solid boxes, used when no font can be found.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxGlyphs;

impl BoxGlyphs {
    const ADVANCE: f32 = 0.6;
    const SPACE_ADVANCE: f32 = 0.3;
    const ASCENT: f32 = 0.8;
    const DESCENT: f32 = -0.2;
    const CAP_HEIGHT: f32 = 0.7;
    const SIDE_BEARING: f32 = 0.05;

    fn is_zero_width(ch: char) -> bool {
        ch.is_control() || matches!(ch, '\u{200B}'..='\u{200D}' | '\u{FEFF}')
    }
}

impl GlyphSource for BoxGlyphs {
    fn advance(&self, ch: char, font_size: f32) -> f32 {
        if Self::is_zero_width(ch) {
            0.0
        } else if ch.is_whitespace() {
            Self::SPACE_ADVANCE * font_size
        } else {
            Self::ADVANCE * font_size
        }
    }

    fn vertical_metrics(&self, font_size: f32) -> VerticalMetrics {
        VerticalMetrics {
            ascent: Self::ASCENT * font_size,
            descent: Self::DESCENT * font_size,
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
        if ch.is_whitespace() || Self::is_zero_width(ch) {
            return false;
        }
        let bearing = Self::SIDE_BEARING * font_size;
        let width = self.advance(ch, font_size) - 2.0 * bearing;
        let height = Self::CAP_HEIGHT * font_size;
        match Rect::from_xywh(x + bearing, baseline - height, width, height) {
            Some(rect) => {
                builder.push_rect(rect);
                true
            }
            None => false,
        }
    }
}

/// How a run was laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Measured and outlined as a single string.
    Native,
    /// Characters placed one by one with extra spacing.
    Spaced,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub ch: char,
    /// Pen position relative to the run's center.
    pub x: f32,
    pub advance: f32,
}

/// A single line of text laid out around its local origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub mode: RunMode,
    pub glyphs: Vec<PlacedGlyph>,
    /// Total width including spacing. Negative spacing can make it shrink
    /// below the sum of advances.
    pub width: f32,
    pub baseline: f32,
    pub metrics: VerticalMetrics,
}

impl TextRun {
    /// Zero spacing takes the native path, anything else the spaced path.
    pub fn layout(text: &str, font: &dyn GlyphSource, font_size: f32, letter_spacing: f32) -> Self {
        if letter_spacing == 0.0 {
            Self::native(text, font, font_size)
        } else {
            Self::spaced(text, font, font_size, letter_spacing)
        }
    }

    /// Center the whole string from its measured width.
    pub fn native(text: &str, font: &dyn GlyphSource, font_size: f32) -> Self {
        let width = font.measure(text, font_size);
        let mut pen = -width / 2.0;
        let glyphs = text
            .chars()
            .map(|ch| {
                let advance = font.advance(ch, font_size);
                let glyph = PlacedGlyph { ch, x: pen, advance };
                pen += advance;
                glyph
            })
            .collect();
        Self::finish(RunMode::Native, glyphs, width, font, font_size)
    }

    /// Place characters one by one with `letter_spacing` between them (not
    /// after the last). Zero-width characters still take their spacing.
    pub fn spaced(text: &str, font: &dyn GlyphSource, font_size: f32, letter_spacing: f32) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let advances: Vec<f32> = chars.iter().map(|&ch| font.advance(ch, font_size)).collect();
        let gaps = chars.len().saturating_sub(1) as f32;
        let width = advances.iter().sum::<f32>() + letter_spacing * gaps;

        let mut pen = -width / 2.0;
        let last = chars.len().saturating_sub(1);
        let glyphs = chars
            .iter()
            .zip(&advances)
            .enumerate()
            .map(|(i, (&ch, &advance))| {
                let glyph = PlacedGlyph { ch, x: pen, advance };
                pen += advance;
                if i < last {
                    pen += letter_spacing;
                }
                glyph
            })
            .collect();
        Self::finish(RunMode::Spaced, glyphs, width, font, font_size)
    }

    fn finish(
        mode: RunMode,
        glyphs: Vec<PlacedGlyph>,
        width: f32,
        font: &dyn GlyphSource,
        font_size: f32,
    ) -> Self {
        let metrics = font.vertical_metrics(font_size);
        Self {
            mode,
            glyphs,
            width,
            baseline: metrics.middle_baseline(),
            metrics,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Outlines to fill: one path for a native run, one per visible
    /// character for a spaced run.
    pub fn paths(&self, font: &dyn GlyphSource, font_size: f32) -> Vec<Path> {
        match self.mode {
            RunMode::Native => {
                let mut builder = PathBuilder::new();
                for glyph in &self.glyphs {
                    font.outline(glyph.ch, font_size, glyph.x, self.baseline, &mut builder);
                }
                builder.finish().into_iter().collect()
            }
            RunMode::Spaced => self
                .glyphs
                .iter()
                .filter_map(|glyph| {
                    let mut builder = PathBuilder::new();
                    if font.outline(glyph.ch, font_size, glyph.x, self.baseline, &mut builder) {
                        builder.finish()
                    } else {
                        None
                    }
                })
                .collect(),
        }
    }

    /// The run's em box in local coordinates.
    pub fn bounds(&self) -> BBox {
        let half = f64::from(self.width.abs()) / 2.0;
        let top = f64::from(self.baseline - self.metrics.ascent);
        let bottom = f64::from(self.baseline - self.metrics.descent);
        BBox::new(Point::new(-half, top), Point::new(half, bottom))
    }
}
