use rstar::{RTree, RTreeObject, AABB};

use crate::geometry::{BBox, Point};
use crate::layer::LayerId;

/// An entry in the hit index: one layer's bounds on a surface.
#[derive(Debug, Clone)]
pub struct HitEntry {
    /// Position in the collection; higher draws on top.
    pub z_index: usize,
    pub layer_id: LayerId,
    pub bbox: BBox,
}

impl RTreeObject for HitEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bbox.min.x, self.bbox.min.y],
            [self.bbox.max.x, self.bbox.max.y],
        )
    }
}

/// Spatial index over rendered layer bounds, for picking the layer under the
/// pointer.
pub struct LayerHitIndex {
    tree: RTree<HitEntry>,
}

impl LayerHitIndex {
    pub fn build(entries: Vec<HitEntry>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// The layer drawn on top at the point. Bounds are inclusive.
    pub fn topmost_at(&self, point: &Point) -> Option<LayerId> {
        let probe = AABB::from_point([point.x, point.y]);
        self.tree
            .locate_in_envelope_intersecting(&probe)
            .max_by_key(|e| e.z_index)
            .map(|e| e.layer_id)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
