//! Conversions between encoded images, `image` buffers and premultiplied
//! tiny-skia surfaces.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use tiny_skia::{IntSize, Pixmap};

use crate::error::{RenderError, Result};

/// Decode PNG or JPEG bytes into a premultiplied surface.
pub fn decode_image(bytes: &[u8]) -> Result<Pixmap> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    pixmap_from_rgba(rgba)
}

/// Take ownership of straight-alpha RGBA pixels.
pub fn pixmap_from_rgba(image: RgbaImage) -> Result<Pixmap> {
    let (width, height) = image.dimensions();
    let size = IntSize::from_wh(width, height).ok_or(RenderError::EmptyImage)?;
    let mut data = image.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, size).ok_or(RenderError::Surface { width, height })
}

/// Straight-alpha copy of a surface.
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> Result<RgbaImage> {
    let data: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|px| {
            let c = px.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), data).ok_or(RenderError::Surface {
        width: pixmap.width(),
        height: pixmap.height(),
    })
}

pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
    let rgba = pixmap_to_rgba(pixmap)?;
    let mut out = Cursor::new(Vec::new());
    rgba.write_to(&mut out, ImageFormat::Png)
        .map_err(RenderError::Encode)?;
    Ok(out.into_inner())
}

/// Approximate Gaussian blur of a premultiplied surface, in time linear in
/// the pixel count whatever the sigma. Blurring premultiplied data directly
/// keeps edges free of dark fringes; channels are clamped back under alpha
/// afterwards since rounding can push them over.
pub fn blur_premultiplied(pixmap: &Pixmap, sigma: f32) -> Result<Pixmap> {
    let (width, height) = (pixmap.width(), pixmap.height());
    if !sigma.is_finite() || sigma <= 0.0 {
        return Ok(pixmap.clone());
    }

    let raw = RgbaImage::from_raw(width, height, pixmap.data().to_vec())
        .ok_or(RenderError::Surface { width, height })?;
    let mut data = image::imageops::fast_blur(&raw, sigma).into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3];
        for c in &mut px[..3] {
            *c = (*c).min(a);
        }
    }

    let size = IntSize::from_wh(width, height).ok_or(RenderError::EmptyImage)?;
    Pixmap::from_vec(data, size).ok_or(RenderError::Surface { width, height })
}
