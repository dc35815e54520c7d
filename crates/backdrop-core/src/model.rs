use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::events::LayerEvent;
use crate::layer::{LayerAttribute, LayerId, TextLayer};

/// Handle returned by [`LayerModel::subscribe`].
pub type ObserverId = usize;

type Observer = Box<dyn FnMut(&LayerEvent, &[TextLayer])>;

/// The ordered text-layer collection of the active project.
///
/// Array order is z-order: later layers draw on top. Every mutation replaces
/// the collection copy-on-write, so a [`snapshot`](Self::snapshot) taken
/// earlier never changes underneath its holder.
pub struct LayerModel {
    layers: Arc<Vec<TextLayer>>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: ObserverId,
}

impl fmt::Debug for LayerModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerModel")
            .field("layers", &self.layers)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for LayerModel {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerModel {
    pub fn new() -> Self {
        Self {
            layers: Arc::new(Vec::new()),
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    pub fn from_layers(layers: Vec<TextLayer>) -> Self {
        let mut model = Self::new();
        model.layers = Arc::new(dedupe_ids(layers));
        model
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn layers(&self) -> &[TextLayer] {
        &self.layers
    }

    /// Cheap, immutable view of the current collection.
    pub fn snapshot(&self) -> Arc<Vec<TextLayer>> {
        Arc::clone(&self.layers)
    }

    pub fn get(&self, id: LayerId) -> Option<&TextLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// One more than the largest id in the collection (ids start at 1).
    pub fn next_id(&self) -> LayerId {
        next_id_after(&self.layers)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append a layer with the editor defaults and return it.
    pub fn add_layer(&mut self) -> TextLayer {
        let layer = TextLayer::new(self.next_id());
        Arc::make_mut(&mut self.layers).push(layer.clone());
        log::debug!("Added layer {}", layer.id);
        self.emit(LayerEvent::Added { id: layer.id });
        layer
    }

    /// Replace one field of a layer. Returns `false` if `id` is unknown.
    pub fn update_attribute(&mut self, id: LayerId, attribute: LayerAttribute) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let name = attribute.name();
        Arc::make_mut(&mut self.layers)[index].apply(attribute);
        log::debug!("Updated {} on layer {}", name, id);
        self.emit(LayerEvent::Updated {
            id,
            attribute: name,
        });
        true
    }

    /// Append a copy of `source_id` under a fresh id, so it renders on top.
    /// Unknown ids leave the collection untouched.
    pub fn duplicate_layer(&mut self, source_id: LayerId) -> Option<LayerId> {
        let source = self.get(source_id)?.clone();
        let id = self.next_id();
        Arc::make_mut(&mut self.layers).push(TextLayer { id, ..source });
        log::debug!("Duplicated layer {} as {}", source_id, id);
        self.emit(LayerEvent::Duplicated {
            source: source_id,
            id,
        });
        Some(id)
    }

    /// Remove a layer by id. Unknown ids leave the collection untouched.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<TextLayer> {
        let index = self.position(id)?;
        let removed = Arc::make_mut(&mut self.layers).remove(index);
        log::debug!("Removed layer {}", id);
        self.emit(LayerEvent::Removed { id });
        Some(removed)
    }

    /// Swap in a whole collection, e.g. one loaded from the store.
    pub fn replace_all(&mut self, layers: Vec<TextLayer>) {
        self.layers = Arc::new(dedupe_ids(layers));
        self.emit(LayerEvent::Replaced);
    }

    // ── Observers ────────────────────────────────────────────────────

    /// Register a callback invoked after every change with the event and the
    /// new collection.
    pub fn subscribe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&LayerEvent, &[TextLayer]) + 'static,
    {
        let id = self.next_observer;
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    fn emit(&mut self, event: LayerEvent) {
        log::trace!(
            "{}: notifying {} observers",
            event.description(),
            self.observers.len()
        );
        let layers = Arc::clone(&self.layers);
        for (_, observer) in &mut self.observers {
            observer(&event, &layers);
        }
    }

    fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }
}

fn next_id_after(layers: &[TextLayer]) -> LayerId {
    let max = layers.iter().map(|l| l.id).max().unwrap_or(0).max(0);
    match max.checked_add(1) {
        Some(id) => id,
        None => smallest_unused(&layers.iter().map(|l| l.id).collect()),
    }
}

/// Lowest positive id not in `taken`. Used once max + 1 would overflow.
fn smallest_unused(taken: &HashSet<LayerId>) -> LayerId {
    (1..=LayerId::MAX)
        .find(|id| !taken.contains(id))
        .unwrap_or(0)
}

fn fresh_id(taken: &HashSet<LayerId>) -> LayerId {
    let max = taken.iter().copied().max().unwrap_or(0).max(0);
    max.checked_add(1)
        .unwrap_or_else(|| smallest_unused(taken))
}

/// Give repeated ids fresh values so ids stay unique.
fn dedupe_ids(mut layers: Vec<TextLayer>) -> Vec<TextLayer> {
    let mut taken: HashSet<LayerId> = layers.iter().map(|l| l.id).collect();
    let mut seen = HashSet::new();
    for layer in &mut layers {
        if !seen.insert(layer.id) {
            let id = fresh_id(&taken);
            log::warn!("Duplicate layer id {} reassigned to {}", layer.id, id);
            layer.id = id;
            taken.insert(id);
            seen.insert(id);
        }
    }
    layers
}
