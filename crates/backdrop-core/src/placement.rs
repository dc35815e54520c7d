//! Layer geometry shared by every renderer.
//!
//! The live preview and the raster export interpret the same [`TextLayer`]
//! values in different coordinate systems. Both go through
//! [`LayerPlacement::resolve`], so anchor, magnitudes and the local transform
//! are computed in exactly one place.

use serde::{Deserialize, Serialize};

use crate::geometry::{Affine, Point};
use crate::layer::TextLayer;

/// Preview container height the editor lays the background out in.
pub const DEFAULT_REFERENCE_PREVIEW_HEIGHT: f64 = 400.0;

/// How a `width x height` image is displayed inside the fixed-height preview,
/// and the resulting scale factor from preview space to native pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewFit {
    pub display_width: f64,
    pub display_height: f64,
    pub scale_factor: f64,
}

impl PreviewFit {
    /// Mirror the preview's contain sizing: wide images are shown at
    /// `min(reference_height, height)`, everything else at `reference_height`.
    pub fn reference(width: f64, height: f64, reference_height: f64) -> Self {
        if width <= 0.0 || height <= 0.0 || reference_height <= 0.0 {
            return Self {
                display_width: width.max(0.0),
                display_height: height.max(0.0),
                scale_factor: 1.0,
            };
        }

        let aspect = width / height;
        let display_height = if aspect > 1.0 {
            reference_height.min(height)
        } else {
            reference_height
        };

        Self {
            display_width: display_height * aspect,
            display_height,
            scale_factor: height / display_height,
        }
    }
}

/// Anchor of a layer on a `width x height` surface. `left`/`top` are
/// percentage offsets from the center and `top` points up.
pub fn anchor_point(width: f64, height: f64, left: f64, top: f64) -> Point {
    Point::new(width * (left + 50.0) / 100.0, height * (50.0 - top) / 100.0)
}

/// Everything a renderer needs to place one layer on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerPlacement {
    pub anchor: Point,
    pub font_size: f64,
    pub letter_spacing: f64,
    pub shadow_offset: f64,
    pub shadow_blur: f64,
    /// Tilt then rotation, relative to the anchor.
    pub local: Affine,
    /// `local` moved to the anchor: maps text-run space to surface space.
    pub transform: Affine,
}

impl LayerPlacement {
    /// Resolve a layer on a `width x height` surface whose pixels are
    /// `scale_factor` times larger than preview-space pixels.
    pub fn resolve(layer: &TextLayer, width: f64, height: f64, scale_factor: f64) -> Self {
        let anchor = anchor_point(width, height, layer.left, layer.top);
        let shadow_offset = layer.rendered_shadow_size() * scale_factor;
        let local = Affine::tilt_degrees(layer.tilt_x, layer.tilt_y)
            .concat(&Affine::rotate_degrees(layer.rotation));
        let transform = Affine::translate(anchor.x, anchor.y).concat(&local);

        Self {
            anchor,
            font_size: layer.rendered_font_size() * scale_factor,
            letter_spacing: layer.rendered_letter_spacing() * scale_factor,
            shadow_offset,
            shadow_blur: shadow_offset * 2.0,
            local,
            transform,
        }
    }
}
