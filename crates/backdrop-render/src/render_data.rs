//! Preview frame: the layered DOM preview described as positioned elements
//! with CSS styles, computed from the same layer geometry as the export.

use backdrop_core::{css_number, LayerId, LayerPlacement, PreviewFit, TextLayer};
use serde::{Deserialize, Serialize};

use crate::viewport::{ImageRect, PreviewViewport};

/// One absolutely positioned text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewLayer {
    pub id: LayerId,
    /// Stacking order; the array index plus one.
    pub z_index: usize,
    pub text: String,
    /// Anchor position in container pixels.
    pub left: f64,
    pub top: f64,
    pub transform: String,
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: u16,
    pub color: String,
    pub opacity: f64,
    pub text_shadow: String,
    pub letter_spacing: f64,
}

/// The background cut-out stacked above every text element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewCutout {
    pub z_index: usize,
    pub rect: ImageRect,
}

/// Complete preview description handed to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewFrame {
    pub container_width: f64,
    pub container_height: f64,
    pub image: ImageRect,
    /// Factor from stored-magnitude pixels to container pixels.
    pub text_scale: f64,
    pub layers: Vec<PreviewLayer>,
    pub cutout: Option<PreviewCutout>,
}

impl PreviewFrame {
    /// Lay out `layers` over an `image_width x image_height` background.
    ///
    /// Text is scaled by the shown image height over the reference display
    /// height, so the preview is exactly the export shrunk to the on-screen
    /// image size.
    pub fn build(
        viewport: &PreviewViewport,
        image_width: f64,
        image_height: f64,
        layers: &[TextLayer],
        has_cutout: bool,
        reference_height: f64,
    ) -> Self {
        let image = viewport.image_rect(image_width, image_height);
        let fit = PreviewFit::reference(image_width, image_height, reference_height);
        let text_scale = if fit.display_height > 0.0 {
            image.height / fit.display_height
        } else {
            1.0
        };

        let cutout_z = layers.len() + 1;
        let layers = layers
            .iter()
            .enumerate()
            .map(|(index, layer)| preview_layer(index, layer, &image, text_scale))
            .collect();

        Self {
            container_width: viewport.width,
            container_height: viewport.height,
            image,
            text_scale,
            layers,
            cutout: has_cutout.then_some(PreviewCutout {
                z_index: cutout_z,
                rect: image,
            }),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn preview_layer(index: usize, layer: &TextLayer, image: &ImageRect, text_scale: f64) -> PreviewLayer {
    let placement = LayerPlacement::resolve(layer, image.width, image.height, text_scale);
    let offset = css_number(placement.shadow_offset);
    PreviewLayer {
        id: layer.id,
        z_index: index + 1,
        text: layer.text.clone(),
        left: image.x + placement.anchor.x,
        top: image.y + placement.anchor.y,
        transform: format!("translate(-50%, -50%) {}", placement.local.to_css()),
        font_family: layer.font_family.clone(),
        font_size: placement.font_size,
        font_weight: layer.font_weight,
        color: layer.color.clone(),
        opacity: layer.opacity,
        text_shadow: format!(
            "{}px {}px {}px {}",
            offset,
            offset,
            css_number(placement.shadow_blur),
            layer.shadow_color
        ),
        letter_spacing: placement.letter_spacing,
    }
}
