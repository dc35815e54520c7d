use backdrop_core::{BBox, HitEntry, LayerHitIndex, LayerPlacement, PreviewFit, TextLayer};

use crate::fonts::FontBook;
use crate::text::TextRun;

/// Device-space bounds of a layer's text on a `width x height` surface.
pub fn layer_bounds(
    fonts: &FontBook,
    layer: &TextLayer,
    width: f64,
    height: f64,
    scale_factor: f64,
) -> Option<BBox> {
    let placement = LayerPlacement::resolve(layer, width, height, scale_factor);
    if layer.text.is_empty() || placement.font_size <= 0.0 {
        return None;
    }
    let font = fonts.resolve(&layer.font_family, layer.font_weight);
    let run = TextRun::layout(
        &layer.text,
        font.as_ref(),
        placement.font_size as f32,
        placement.letter_spacing as f32,
    );
    Some(placement.transform.transform_bbox(&run.bounds()))
}

/// Index every layer's bounds on the native `width x height` image.
pub fn build_hit_index(
    fonts: &FontBook,
    layers: &[TextLayer],
    width: f64,
    height: f64,
    reference_height: f64,
) -> LayerHitIndex {
    let fit = PreviewFit::reference(width, height, reference_height);
    let entries = layers
        .iter()
        .enumerate()
        .filter_map(|(z_index, layer)| {
            layer_bounds(fonts, layer, width, height, fit.scale_factor).map(|bbox| HitEntry {
                z_index,
                layer_id: layer.id,
                bbox,
            })
        })
        .collect();
    LayerHitIndex::build(entries)
}
