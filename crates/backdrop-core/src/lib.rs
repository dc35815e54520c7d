//! # Backdrop Core
//!
//! Text layer data model for the text-behind-image editor: the ordered,
//! copy-on-write layer collection with change observers, the layer geometry
//! shared by the live preview and the raster export, and an R-tree hit index
//! for picking layers.

pub mod events;
pub mod geometry;
pub mod layer;
pub mod model;
pub mod placement;
pub mod spatial;

pub use events::LayerEvent;
pub use geometry::{css_number, Affine, BBox, Point};
pub use layer::{AttributeRange, LayerAttribute, LayerError, LayerId, TextLayer};
pub use model::{LayerModel, ObserverId};
pub use placement::{anchor_point, LayerPlacement, PreviewFit, DEFAULT_REFERENCE_PREVIEW_HEIGHT};
pub use spatial::{HitEntry, LayerHitIndex};
