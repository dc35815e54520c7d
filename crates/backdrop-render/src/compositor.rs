//! Raster export: flattens background, text layers and the cut-out into one
//! surface at the background's native resolution.

use backdrop_core::{
    BBox, LayerPlacement, PreviewFit, TextLayer, DEFAULT_REFERENCE_PREVIEW_HEIGHT,
};
use tiny_skia::{FillRule, FilterQuality, Paint, Path, Pixmap, PixmapPaint, Transform};

use crate::color::Rgba;
use crate::error::{RenderError, Result};
use crate::fonts::FontBook;
use crate::raster::{blur_premultiplied, decode_image, encode_png};
use crate::text::TextRun;

/// Largest shadow scratch surface, as a multiple of the output's pixel count,
/// but never less than `MIN_SHADOW_SCRATCH` pixels.
const SHADOW_SCRATCH_BUDGET: u64 = 8;
const MIN_SHADOW_SCRATCH: u64 = 1 << 20;

pub struct Compositor<'a> {
    fonts: &'a FontBook,
    reference_preview_height: f64,
}

impl<'a> Compositor<'a> {
    pub fn new(fonts: &'a FontBook) -> Self {
        Self {
            fonts,
            reference_preview_height: DEFAULT_REFERENCE_PREVIEW_HEIGHT,
        }
    }

    pub fn with_reference_height(mut self, reference_preview_height: f64) -> Self {
        self.reference_preview_height = reference_preview_height;
        self
    }

    /// Decode, compose and encode as PNG. A background that cannot be decoded
    /// fails the export; a foreground that cannot be decoded is dropped.
    pub fn export_png(
        &self,
        background: &[u8],
        foreground: Option<&[u8]>,
        layers: &[TextLayer],
    ) -> Result<Vec<u8>> {
        let background = decode_image(background)?;
        let foreground = foreground.and_then(|bytes| match decode_image(bytes) {
            Ok(pixmap) => Some(pixmap),
            Err(e) => {
                log::warn!("Foreground unavailable, exporting without it: {}", e);
                None
            }
        });

        let composed = self.compose(&background, foreground.as_ref(), layers)?;
        encode_png(&composed)
    }

    /// Background, then every layer in order, then the cut-out on top.
    pub fn compose(
        &self,
        background: &Pixmap,
        foreground: Option<&Pixmap>,
        layers: &[TextLayer],
    ) -> Result<Pixmap> {
        let mut surface = background.clone();
        let (width, height) = (f64::from(surface.width()), f64::from(surface.height()));
        let fit = PreviewFit::reference(width, height, self.reference_preview_height);
        log::debug!(
            "Composing {} layers on {}x{} (scale {:.3})",
            layers.len(),
            width,
            height,
            fit.scale_factor
        );

        for layer in layers {
            self.draw_layer(&mut surface, layer, fit.scale_factor)?;
        }

        if let Some(cutout) = foreground {
            let same_size =
                cutout.width() == surface.width() && cutout.height() == surface.height();
            let (quality, transform) = if same_size {
                (FilterQuality::Nearest, Transform::identity())
            } else {
                (
                    FilterQuality::Bilinear,
                    Transform::from_scale(
                        surface.width() as f32 / cutout.width() as f32,
                        surface.height() as f32 / cutout.height() as f32,
                    ),
                )
            };
            let paint = PixmapPaint {
                quality,
                ..PixmapPaint::default()
            };
            surface.draw_pixmap(0, 0, cutout.as_ref(), &paint, transform, None);
        }

        Ok(surface)
    }

    fn draw_layer(&self, surface: &mut Pixmap, layer: &TextLayer, scale_factor: f64) -> Result<()> {
        let placement = LayerPlacement::resolve(
            layer,
            f64::from(surface.width()),
            f64::from(surface.height()),
            scale_factor,
        );
        let opacity = layer.opacity.clamp(0.0, 1.0) as f32;
        if layer.text.is_empty() || placement.font_size <= 0.0 || opacity <= 0.0 {
            return Ok(());
        }

        let font = self.fonts.resolve(&layer.font_family, layer.font_weight);
        let font_size = placement.font_size as f32;
        let run = TextRun::layout(
            &layer.text,
            font.as_ref(),
            font_size,
            placement.letter_spacing as f32,
        );
        let paths = run.paths(font.as_ref(), font_size);
        if paths.is_empty() {
            return Ok(());
        }
        let transform = skia_transform(&placement);

        let shadow = Rgba::parse_or(&layer.shadow_color, Rgba::TRANSPARENT);
        if !shadow.is_transparent() && placement.shadow_offset != 0.0 {
            let bounds = placement.transform.transform_bbox(&run.bounds());
            draw_shadow(surface, &paths, transform, bounds, &placement, shadow.to_skia(opacity))?;
        }

        let fill = Rgba::parse_or(&layer.color, Rgba::BLACK);
        let mut paint = Paint::default();
        paint.set_color(fill.to_skia(opacity));
        paint.anti_alias = true;
        for path in &paths {
            surface.fill_path(path, &paint, FillRule::Winding, transform, None);
        }
        Ok(())
    }
}

fn skia_transform(placement: &LayerPlacement) -> Transform {
    let m = placement.transform;
    Transform::from_row(
        m.a as f32, m.b as f32, m.c as f32, m.d as f32, m.e as f32, m.f as f32,
    )
}

/// Draw the blurred silhouette of `paths`, offset in device space like a
/// canvas shadow, on a scratch surface cropped to the text's bounds.
fn draw_shadow(
    surface: &mut Pixmap,
    paths: &[Path],
    transform: Transform,
    bounds: BBox,
    placement: &LayerPlacement,
    color: tiny_skia::Color,
) -> Result<()> {
    let (surface_w, surface_h) = (f64::from(surface.width()), f64::from(surface.height()));
    // Past a quarter of the surface a wider blur only flattens further.
    let sigma = (placement.shadow_blur / 2.0)
        .abs()
        .min(surface_w.min(surface_h) / 4.0);
    let pad = (3.0 * sigma + 1.0).ceil();
    let offset = placement.shadow_offset;

    // Only the part that can land on the surface after the offset matters.
    let min_x = (bounds.min.x - pad).max(-offset - pad).floor();
    let min_y = (bounds.min.y - pad).max(-offset - pad).floor();
    let max_x = (bounds.max.x + pad).min(surface_w - offset + pad).ceil();
    let max_y = (bounds.max.y + pad).min(surface_h - offset + pad).ceil();
    let finite = [min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite());
    if !finite || max_x <= min_x || max_y <= min_y {
        return Ok(());
    }
    let (width, height) = ((max_x - min_x) as u32, (max_y - min_y) as u32);
    let budget = (u64::from(surface.width()) * u64::from(surface.height()) * SHADOW_SCRATCH_BUDGET)
        .max(MIN_SHADOW_SCRATCH);
    if u64::from(width) * u64::from(height) > budget {
        return Err(RenderError::Surface { width, height });
    }
    let mut scratch = Pixmap::new(width, height).ok_or(RenderError::Surface { width, height })?;

    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    let local = transform.post_translate(-min_x as f32, -min_y as f32);
    for path in paths {
        scratch.fill_path(path, &paint, FillRule::Winding, local, None);
    }

    let blurred = blur_premultiplied(&scratch, sigma as f32)?;
    surface.draw_pixmap(
        0,
        0,
        blurred.as_ref(),
        &PixmapPaint::default(),
        Transform::from_translate((min_x + offset) as f32, (min_y + offset) as f32),
        None,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn solid(width: u32, height: u32, color: Color) -> Pixmap {
        let mut pixmap = Pixmap::new(width, height).unwrap();
        pixmap.fill(color);
        pixmap
    }

    fn box_layer(id: i64, color: &str) -> TextLayer {
        // 200x100 surfaces fit at scale 1, so a stored size of 400 is 40px.
        TextLayer::new(id)
            .with_text("W")
            .with_font("Inter", 400.0, 700)
            .with_color(color)
            .with_shadow("black", 0.0)
    }

    fn rgb(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8) {
        let px = pixmap.pixel(x, y).unwrap().demultiply();
        (px.red(), px.green(), px.blue())
    }

    #[test]
    fn test_later_layers_draw_on_top() {
        let fonts = FontBook::new("Inter");
        let compositor = Compositor::new(&fonts);
        let bg = solid(200, 100, Color::WHITE);

        let out = compositor
            .compose(&bg, None, &[box_layer(1, "#ff0000"), box_layer(2, "#0000ff")])
            .unwrap();
        assert_eq!(rgb(&out, 100, 50), (0, 0, 255));

        let out = compositor
            .compose(&bg, None, &[box_layer(2, "#0000ff"), box_layer(1, "#ff0000")])
            .unwrap();
        assert_eq!(rgb(&out, 100, 50), (255, 0, 0));
    }

    #[test]
    fn test_background_kept_outside_text() {
        let fonts = FontBook::new("Inter");
        let bg = solid(200, 100, Color::WHITE);
        let out = Compositor::new(&fonts)
            .compose(&bg, None, &[box_layer(1, "#ff0000")])
            .unwrap();
        assert_eq!((out.width(), out.height()), (200, 100));
        assert_eq!(rgb(&out, 5, 5), (255, 255, 255));
        assert_eq!(rgb(&out, 100, 50), (255, 0, 0));
    }

    #[test]
    fn test_position_follows_anchor() {
        let fonts = FontBook::new("Inter");
        let bg = solid(200, 100, Color::WHITE);
        // Anchor at (50, 50).
        let layer = box_layer(1, "#ff0000").with_position(-25.0, 0.0);
        let out = Compositor::new(&fonts).compose(&bg, None, &[layer]).unwrap();
        assert_eq!(rgb(&out, 50, 50), (255, 0, 0));
        assert_eq!(rgb(&out, 100, 50), (255, 255, 255));
    }

    #[test]
    fn test_opacity_blends() {
        let fonts = FontBook::new("Inter");
        let bg = solid(200, 100, Color::WHITE);
        let mut layer = box_layer(1, "#000000");
        layer.opacity = 0.5;
        let out = Compositor::new(&fonts).compose(&bg, None, &[layer]).unwrap();
        let (r, _, _) = rgb(&out, 100, 50);
        assert!((120..=136).contains(&r), "got {}", r);
    }

    #[test]
    fn test_shadow_falls_down_and_right() {
        let fonts = FontBook::new("Inter");
        let bg = solid(200, 100, Color::WHITE);
        // 4px offset, 8px blur; the glyph box ends at (110, 62).
        let layer = box_layer(1, "#ffffff").with_shadow("black", 40.0);
        let out = Compositor::new(&fonts).compose(&bg, None, &[layer]).unwrap();
        let (r, _, _) = rgb(&out, 112, 64);
        assert!(r < 250, "got {}", r);
        assert_eq!(rgb(&out, 5, 5), (255, 255, 255));
    }

    #[test]
    fn test_oversized_shadow_stays_bounded() {
        let fonts = FontBook::new("Inter");
        let bg = solid(400, 200, Color::WHITE);
        let compositor = Compositor::new(&fonts);
        for size in [500.0, 1.0e6, f64::MAX] {
            let layer = box_layer(1, "#ff0000").with_shadow("black", size);
            let out = compositor.compose(&bg, None, &[layer]).unwrap();
            assert_eq!((out.width(), out.height()), (400, 200));
            // The text itself still lands on the anchor.
            assert_eq!(rgb(&out, 200, 100), (255, 0, 0));
        }
    }

    #[test]
    fn test_foreground_only_covers_opaque_pixels() {
        let fonts = FontBook::new("Inter");
        let compositor = Compositor::new(&fonts);
        let bg = solid(200, 100, Color::WHITE);
        let layers = [box_layer(1, "#ff0000")];

        let mut cutout = Pixmap::new(200, 100).unwrap();
        let mut paint = Paint::default();
        paint.set_color(Color::from_rgba8(0, 255, 0, 255));
        let left_half = tiny_skia::Rect::from_xywh(0.0, 0.0, 100.0, 100.0).unwrap();
        cutout.fill_rect(left_half, &paint, Transform::identity(), None);

        let without = compositor.compose(&bg, None, &layers).unwrap();
        let with = compositor.compose(&bg, Some(&cutout), &layers).unwrap();

        assert_eq!(rgb(&with, 95, 50), (0, 255, 0));
        for y in 0..100 {
            for x in 100..200 {
                assert_eq!(with.pixel(x, y), without.pixel(x, y));
            }
        }
    }

    #[test]
    fn test_bad_foreground_is_not_fatal() {
        let fonts = FontBook::new("Inter");
        let bg = encode_png(&solid(40, 20, Color::WHITE)).unwrap();
        let compositor = Compositor::new(&fonts);

        let png = compositor
            .export_png(&bg, Some(b"not a png"), &[box_layer(1, "red")])
            .unwrap();
        assert!(decode_image(&png).is_ok());

        assert!(matches!(
            compositor.export_png(b"not a png", None, &[]),
            Err(RenderError::Decode(_))
        ));
    }

    #[test]
    fn test_empty_text_draws_nothing() {
        let fonts = FontBook::new("Inter");
        let bg = solid(50, 50, Color::WHITE);
        let layer = box_layer(1, "#ff0000").with_text("");
        let out = Compositor::new(&fonts).compose(&bg, None, &[layer]).unwrap();
        assert_eq!(out.data(), bg.data());
    }
}
