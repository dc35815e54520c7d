use crate::layer::LayerId;

/// Notification sent to [`LayerModel`](crate::LayerModel) observers after
/// each change to the collection.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    Added { id: LayerId },
    Updated { id: LayerId, attribute: &'static str },
    Duplicated { source: LayerId, id: LayerId },
    Removed { id: LayerId },
    /// The whole collection was swapped (e.g. loaded from the store).
    Replaced,
}

impl LayerEvent {
    /// Whether the event adds, removes or reorders layers rather than
    /// editing one in place.
    pub fn is_structural(&self) -> bool {
        !matches!(self, LayerEvent::Updated { .. })
    }

    /// The layer the event is about, if any.
    pub fn layer_id(&self) -> Option<LayerId> {
        match self {
            LayerEvent::Added { id }
            | LayerEvent::Updated { id, .. }
            | LayerEvent::Duplicated { id, .. }
            | LayerEvent::Removed { id } => Some(*id),
            LayerEvent::Replaced => None,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            LayerEvent::Added { .. } => "Add layer",
            LayerEvent::Updated { .. } => "Edit layer",
            LayerEvent::Duplicated { .. } => "Duplicate layer",
            LayerEvent::Removed { .. } => "Remove layer",
            LayerEvent::Replaced => "Load layers",
        }
    }
}
