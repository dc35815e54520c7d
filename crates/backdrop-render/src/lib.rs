//! # Backdrop Renderer
//!
//! Two interpreters over the same text layers: the raster [`Compositor`]
//! used for export, and the [`PreviewFrame`] describing the live layered
//! preview. Both place layers through `backdrop_core::LayerPlacement`.

pub mod color;
pub mod compositor;
pub mod error;
pub mod fonts;
pub mod hit;
pub mod raster;
pub mod render_data;
pub mod text;
pub mod viewport;

pub use color::{ColorError, Rgba};
pub use compositor::Compositor;
pub use error::{RenderError, Result};
pub use fonts::{FontBook, FontFace};
pub use hit::{build_hit_index, layer_bounds};
pub use raster::{decode_image, encode_png};
pub use render_data::{PreviewCutout, PreviewFrame, PreviewLayer};
pub use text::{BoxGlyphs, GlyphSource, TextRun};
pub use viewport::{ImageRect, PreviewViewport};

pub use tiny_skia::Pixmap;
