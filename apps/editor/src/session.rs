//! The editing session: one open project, its layer collection, and the
//! glue to persistence, uploads, background removal and export.

use std::sync::Arc;
use std::time::Instant;

use backdrop_core::{LayerAttribute, LayerEvent, LayerId, LayerModel, ObserverId, Point, TextLayer};
use backdrop_io::{ProjectId, ProjectStore, StorageId, StoreError, UploadService, UserId};
use backdrop_render::{
    build_hit_index, decode_image, Compositor, FontBook, PreviewFrame, PreviewViewport,
};
use serde_json::Value;

use crate::background::BackgroundRemover;
use crate::coalesce::SaveCoalescer;
use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::notify::{Notice, NoticeQueue};

/// A decoded-once image held by the session.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub storage: Option<StorageId>,
    pub bytes: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

impl ImageAsset {
    pub fn from_bytes(bytes: Vec<u8>, storage: Option<StorageId>) -> Result<Self> {
        let pixmap = decode_image(&bytes)?;
        Ok(Self {
            storage,
            width: pixmap.width(),
            height: pixmap.height(),
            bytes: Arc::new(bytes),
        })
    }
}

/// Everything an export needs, captured when it starts.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub background: Arc<Vec<u8>>,
    pub foreground: Option<Arc<Vec<u8>>>,
    pub layers: Arc<Vec<TextLayer>>,
}

#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub file_name: String,
    pub png: Vec<u8>,
}

pub struct EditorSession<S: ProjectStore, U: UploadService> {
    store: S,
    uploads: U,
    fonts: FontBook,
    config: EditorConfig,
    user: Option<UserId>,
    project_id: ProjectId,
    title: String,
    is_owner: bool,
    model: LayerModel,
    selected: Option<LayerId>,
    background: Option<ImageAsset>,
    foreground: Option<ImageAsset>,
    saves: SaveCoalescer,
    exporting: bool,
    notices: NoticeQueue,
}

impl<S: ProjectStore, U: UploadService> EditorSession<S, U> {
    /// Load a project and its images. Missing or unreadable images only
    /// produce a notice.
    pub fn open(
        store: S,
        uploads: U,
        fonts: FontBook,
        config: EditorConfig,
        user: Option<&str>,
        project_id: ProjectId,
    ) -> Result<Self> {
        let view = store
            .get_project(user, project_id)?
            .ok_or(EditorError::ProjectNotFound(project_id))?;
        let project = view.project;

        let mut notices = NoticeQueue::default();
        let background = project
            .original_image
            .and_then(|id| load_asset(&uploads, id, "background", &mut notices));
        let foreground = project
            .processed_image
            .and_then(|id| load_asset(&uploads, id, "cut-out", &mut notices));

        log::info!(
            "Opened project '{}' ({} layers, owner: {})",
            project.title,
            project.text_layers.len(),
            view.is_owner
        );

        Ok(Self {
            saves: SaveCoalescer::new(config.save_quiescence()),
            store,
            uploads,
            fonts,
            config,
            user: user.map(str::to_string),
            project_id,
            title: project.title,
            is_owner: view.is_owner,
            model: LayerModel::from_layers(project.text_layers),
            selected: None,
            background,
            foreground,
            exporting: false,
            notices,
        })
    }

    /// Create a project for `user` and open it.
    pub fn create(
        store: S,
        uploads: U,
        fonts: FontBook,
        config: EditorConfig,
        user: Option<&str>,
        title: &str,
        is_public: bool,
    ) -> Result<Self> {
        let id = store.create_project(user, title, is_public)?;
        Self::open(store, uploads, fonts, config, user, id)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_editable(&self) -> bool {
        self.user.is_some() && self.is_owner
    }

    pub fn layers(&self) -> &[TextLayer] {
        self.model.layers()
    }

    pub fn layer(&self, id: LayerId) -> Option<&TextLayer> {
        self.model.get(id)
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn background(&self) -> Option<&ImageAsset> {
        self.background.as_ref()
    }

    pub fn foreground(&self) -> Option<&ImageAsset> {
        self.foreground.as_ref()
    }

    pub fn has_pending_save(&self) -> bool {
        self.saves.is_pending()
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn uploads(&self) -> &U {
        &self.uploads
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Observe layer changes, e.g. to re-render the preview.
    pub fn subscribe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&LayerEvent, &[TextLayer]) + 'static,
    {
        self.model.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.model.unsubscribe(id)
    }

    // ── Layer editing ────────────────────────────────────────────────

    /// Append a default layer, select it and save.
    pub fn add_layer(&mut self) -> Result<TextLayer> {
        self.require_editable()?;
        let layer = self.model.add_layer();
        self.selected = Some(layer.id);
        self.save_now();
        Ok(layer)
    }

    pub fn update_attribute(&mut self, id: LayerId, attribute: LayerAttribute) -> Result<bool> {
        self.update_attribute_at(id, attribute, Instant::now())
    }

    /// Apply an edit; the save is coalesced with edits that follow within
    /// the quiet period. Returns `false` for unknown ids.
    pub fn update_attribute_at(
        &mut self,
        id: LayerId,
        attribute: LayerAttribute,
        now: Instant,
    ) -> Result<bool> {
        self.require_editable()?;
        if !self.model.update_attribute(id, attribute) {
            return Ok(false);
        }
        self.saves.note_edit(now);
        Ok(true)
    }

    /// Edit a field by its persisted name with a dynamic value.
    pub fn set_attribute(&mut self, id: LayerId, name: &str, value: &Value) -> Result<bool> {
        self.set_attribute_at(id, name, value, Instant::now())
    }

    pub fn set_attribute_at(
        &mut self,
        id: LayerId,
        name: &str,
        value: &Value,
        now: Instant,
    ) -> Result<bool> {
        let attribute = LayerAttribute::from_json(name, value).map_err(|e| {
            log::warn!("Ignoring edit of layer {}: {}", id, e);
            e
        })?;
        self.update_attribute_at(id, attribute, now)
    }

    /// Copy a layer on top of the others and select the copy.
    pub fn duplicate_layer(&mut self, id: LayerId) -> Result<Option<LayerId>> {
        self.require_editable()?;
        let Some(copy) = self.model.duplicate_layer(id) else {
            return Ok(None);
        };
        self.selected = Some(copy);
        self.save_now();
        Ok(Some(copy))
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Result<bool> {
        self.require_editable()?;
        if self.model.remove_layer(id).is_none() {
            return Ok(false);
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.save_now();
        Ok(true)
    }

    /// Move a layer by a pointer drag in preview container pixels.
    pub fn drag_layer_at(
        &mut self,
        id: LayerId,
        viewport: &PreviewViewport,
        dx: f64,
        dy: f64,
        now: Instant,
    ) -> Result<bool> {
        let (Some(layer), Some(bg)) = (self.model.get(id), self.background.as_ref()) else {
            return Ok(false);
        };
        let (dl, dt) = viewport.drag_delta(dx, dy, f64::from(bg.width), f64::from(bg.height));
        let (left, top) = (layer.left + dl, layer.top + dt);
        self.update_attribute_at(id, LayerAttribute::Left(left), now)?;
        self.update_attribute_at(id, LayerAttribute::Top(top), now)
    }

    pub fn select(&mut self, id: Option<LayerId>) -> bool {
        match id {
            Some(id) if !self.model.contains(id) => false,
            _ => {
                self.selected = id;
                true
            }
        }
    }

    /// Topmost layer under a point in background pixels.
    pub fn layer_at(&self, point: &Point) -> Option<LayerId> {
        let bg = self.background.as_ref()?;
        build_hit_index(
            &self.fonts,
            self.model.layers(),
            f64::from(bg.width),
            f64::from(bg.height),
            self.config.reference_preview_height,
        )
        .topmost_at(point)
    }

    /// Select whatever is under the point, or clear the selection.
    pub fn select_at(&mut self, point: &Point) -> Option<LayerId> {
        self.selected = self.layer_at(point);
        self.selected
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Save if the quiet period after the last edit has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.saves.is_due(now) {
            self.save_now()
        } else {
            false
        }
    }

    /// Save any pending edits right away. Returns `false` if a save failed.
    pub fn flush(&mut self) -> bool {
        if self.saves.is_pending() {
            self.save_now()
        } else {
            true
        }
    }

    /// Leave the project: nothing pending may be lost.
    pub fn close(&mut self) -> bool {
        log::info!("Closing project '{}'", self.title);
        self.flush()
    }

    /// Write the whole collection. A failure is reported but the in-memory
    /// layers are kept; the next successful save reconciles.
    fn save_now(&mut self) -> bool {
        self.saves.take();
        match self
            .store
            .save_layers(self.user.as_deref(), self.project_id, self.model.layers())
        {
            Ok(()) => true,
            Err(e) => {
                if e.is_authorization() {
                    log::error!("Save of project {} rejected: {}", self.project_id, e);
                }
                self.notices
                    .push(Notice::error(format!("Failed to save changes: {}", e)));
                false
            }
        }
    }

    // ── Images ───────────────────────────────────────────────────────

    /// Upload a new photo as the background, then try once to cut out its
    /// subject. A failed cut-out leaves the session without a foreground.
    pub fn upload_image(&mut self, bytes: Vec<u8>, remover: &mut dyn BackgroundRemover) -> Result<()> {
        self.require_editable()?;
        let mut asset = match ImageAsset::from_bytes(bytes, None) {
            Ok(asset) => asset,
            Err(e) => {
                self.notices
                    .push(Notice::error(format!("Unsupported image: {}", e)));
                return Err(e);
            }
        };

        let stored = self
            .store_blob(asset.bytes.as_ref().clone())
            .and_then(|id| {
                self.store
                    .update_project_image(self.user.as_deref(), self.project_id, id)
                    .map(|()| id)
            });
        let storage = match stored {
            Ok(id) => id,
            Err(e) => {
                self.notices
                    .push(Notice::error(format!("Failed to upload image: {}", e)));
                return Err(e.into());
            }
        };
        asset.storage = Some(storage);
        let source = Arc::clone(&asset.bytes);
        self.background = Some(asset);
        self.foreground = None;

        self.notices.push(Notice::info("Removing background..."));
        match remover.remove_background(&source) {
            Ok(cutout) => self.attach_cutout(cutout),
            Err(e) => self
                .notices
                .push(Notice::error(format!("{}; continuing without a cut-out", e))),
        }
        Ok(())
    }

    fn attach_cutout(&mut self, cutout: Vec<u8>) {
        let result = ImageAsset::from_bytes(cutout, None).and_then(|mut asset| {
            let id = self.store_blob(asset.bytes.as_ref().clone())?;
            self.store
                .save_processed_image(self.user.as_deref(), self.project_id, id)?;
            asset.storage = Some(id);
            Ok(asset)
        });
        match result {
            Ok(asset) => {
                self.foreground = Some(asset);
                self.notices.push(Notice::success("Background removed"));
            }
            Err(e) => self
                .notices
                .push(Notice::error(format!("Failed to store cut-out: {}", e))),
        }
    }

    fn store_blob(&self, bytes: Vec<u8>) -> std::result::Result<StorageId, StoreError> {
        let target = self.uploads.request_upload_target(self.user.as_deref())?;
        self.uploads.upload(&target, bytes)
    }

    // ── Preview and export ───────────────────────────────────────────

    pub fn preview_frame(&self, viewport: &PreviewViewport) -> Option<PreviewFrame> {
        let bg = self.background.as_ref()?;
        Some(PreviewFrame::build(
            viewport,
            f64::from(bg.width),
            f64::from(bg.height),
            self.model.layers(),
            self.foreground.is_some(),
            self.config.reference_preview_height,
        ))
    }

    /// Snapshot the inputs and mark an export as running. `None` while
    /// another export runs or without a background.
    pub fn begin_export(&mut self) -> Option<ExportJob> {
        if self.exporting {
            log::debug!("Export already running");
            return None;
        }
        let bg = self.background.as_ref()?;
        let job = ExportJob {
            background: Arc::clone(&bg.bytes),
            foreground: self.foreground.as_ref().map(|fg| Arc::clone(&fg.bytes)),
            layers: self.model.snapshot(),
        };
        self.exporting = true;
        log::info!("Export started with {} layers", job.layers.len());
        Some(job)
    }

    /// Render a job and clear the busy flag. No file is produced on failure.
    pub fn finish_export(&mut self, job: ExportJob) -> Result<ExportedImage> {
        let result = Compositor::new(&self.fonts)
            .with_reference_height(self.config.reference_preview_height)
            .export_png(
                &job.background,
                job.foreground.as_deref().map(Vec::as_slice),
                &job.layers,
            );
        self.exporting = false;

        match result {
            Ok(png) => {
                log::info!("Export finished ({} bytes)", png.len());
                self.notices.push(Notice::success("Image exported"));
                Ok(ExportedImage {
                    file_name: self.config.export_file_name.clone(),
                    png,
                })
            }
            Err(e) => {
                self.notices
                    .push(Notice::error(format!("Failed to export image: {}", e)));
                Err(e.into())
            }
        }
    }

    pub fn export(&mut self) -> Result<ExportedImage> {
        if self.exporting {
            return Err(EditorError::ExportBusy);
        }
        let job = self.begin_export().ok_or(EditorError::NoBackground)?;
        self.finish_export(job)
    }

    fn require_editable(&self) -> Result<()> {
        if self.user.is_none() {
            return Err(EditorError::NotAuthenticated);
        }
        if !self.is_owner {
            return Err(EditorError::ReadOnly);
        }
        Ok(())
    }
}

impl<S: ProjectStore, U: UploadService> Drop for EditorSession<S, U> {
    fn drop(&mut self) {
        if self.saves.is_pending() {
            log::info!("Saving pending edits before closing '{}'", self.title);
            self.save_now();
        }
    }
}

fn load_asset<U: UploadService>(
    uploads: &U,
    id: StorageId,
    what: &str,
    notices: &mut NoticeQueue,
) -> Option<ImageAsset> {
    let loaded = uploads
        .fetch(id)
        .map_err(EditorError::from)
        .and_then(|bytes| ImageAsset::from_bytes(bytes, Some(id)));
    match loaded {
        Ok(asset) => Some(asset),
        Err(e) => {
            notices.push(Notice::error(format!("Failed to load {} image: {}", what, e)));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    use backdrop_io::{MemoryBlobs, MemoryStore, Project, ProjectView};
    use backdrop_render::{encode_png, Pixmap};
    use serde_json::json;

    use super::*;
    use crate::background::{NoRemover, RemovalError};
    use crate::notify::NoticeLevel;

    const ALICE: Option<&str> = Some("alice");

    type Session = EditorSession<Arc<MemoryStore>, Arc<MemoryBlobs>>;

    fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let mut pixmap = Pixmap::new(width, height).unwrap();
        for px in pixmap.data_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        encode_png(&pixmap).unwrap()
    }

    fn config() -> EditorConfig {
        EditorConfig {
            load_system_fonts: false,
            ..EditorConfig::default()
        }
    }

    fn new_session(store: &Arc<MemoryStore>, blobs: &Arc<MemoryBlobs>) -> Session {
        EditorSession::create(
            Arc::clone(store),
            Arc::clone(blobs),
            FontBook::new("Inter"),
            config(),
            ALICE,
            "Test",
            false,
        )
        .unwrap()
    }

    fn stored(store: &MemoryStore, id: ProjectId) -> Project {
        store.get_project(ALICE, id).unwrap().unwrap().project
    }

    #[test]
    fn test_add_duplicate_remove_scenario() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);

        let layer = session.add_layer().unwrap();
        assert_eq!(layer.id, 1);
        assert_eq!(layer.text, "edit");
        assert_eq!(session.selected(), Some(1));

        assert!(session
            .update_attribute(1, LayerAttribute::FontSize(400.0))
            .unwrap());
        assert_eq!(session.duplicate_layer(1).unwrap(), Some(2));
        assert_eq!(session.layers()[1].id, 2);
        assert!((session.layers()[1].font_size - 400.0).abs() < 1e-10);

        session.select(Some(1));
        assert!(session.remove_layer(1).unwrap());
        assert_eq!(session.selected(), None);
        assert_eq!(session.layers().len(), 1);
        assert_eq!(session.layers()[0].id, 2);

        let saved = stored(&store, session.project_id());
        assert_eq!(saved.text_layers, session.layers().to_vec());
    }

    #[test]
    fn test_unknown_ids_are_silent() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);
        session.add_layer().unwrap();
        let before = session.layers().to_vec();

        assert_eq!(session.duplicate_layer(42).unwrap(), None);
        assert!(!session.remove_layer(42).unwrap());
        assert!(!session.update_attribute(42, LayerAttribute::Top(3.0)).unwrap());
        assert!(!session.select(Some(42)));
        assert_eq!(session.layers(), before.as_slice());
        assert!(session.drain_notices().is_empty());
    }

    #[test]
    fn test_attribute_edits_are_coalesced() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);
        let id = session.project_id();
        session.add_layer().unwrap();

        let t0 = Instant::now();
        session
            .update_attribute_at(1, LayerAttribute::Rotation(10.0), t0)
            .unwrap();
        session
            .set_attribute_at(1, "rotation", &json!(20), t0 + Duration::from_millis(100))
            .unwrap();

        assert!(!session.tick(t0 + Duration::from_millis(300)));
        assert!((stored(&store, id).text_layers[0].rotation - 0.0).abs() < 1e-10);

        assert!(session.tick(t0 + Duration::from_millis(400)));
        assert!((stored(&store, id).text_layers[0].rotation - 20.0).abs() < 1e-10);
        assert!(!session.has_pending_save());
    }

    #[test]
    fn test_close_and_drop_flush_pending_edits() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);
        let id = session.project_id();
        session.add_layer().unwrap();

        session
            .update_attribute(1, LayerAttribute::Text("close".into()))
            .unwrap();
        assert!(session.close());
        assert_eq!(stored(&store, id).text_layers[0].text, "close");

        session
            .update_attribute(1, LayerAttribute::Text("drop".into()))
            .unwrap();
        drop(session);
        assert_eq!(stored(&store, id).text_layers[0].text, "drop");
    }

    #[test]
    fn test_bad_dynamic_edit_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);
        session.add_layer().unwrap();

        assert!(matches!(
            session.set_attribute(1, "fontSize", &json!("big")),
            Err(EditorError::Layer(_))
        ));
        assert!(matches!(
            session.set_attribute(1, "kerning", &json!(1)),
            Err(EditorError::Layer(_))
        ));
        assert!(!session.has_pending_save());
    }

    /// Store whose layer saves can be switched off.
    struct FlakyStore {
        inner: MemoryStore,
        offline: Cell<bool>,
    }

    impl ProjectStore for FlakyStore {
        fn create_project(&self, user: Option<&str>, title: &str, is_public: bool) -> backdrop_io::Result<ProjectId> {
            self.inner.create_project(user, title, is_public)
        }

        fn get_project(&self, user: Option<&str>, id: ProjectId) -> backdrop_io::Result<Option<ProjectView>> {
            self.inner.get_project(user, id)
        }

        fn list_user_projects(&self, user: Option<&str>) -> backdrop_io::Result<Vec<Project>> {
            self.inner.list_user_projects(user)
        }

        fn list_public_projects(&self) -> backdrop_io::Result<Vec<Project>> {
            self.inner.list_public_projects()
        }

        fn update_project_image(&self, user: Option<&str>, id: ProjectId, image: StorageId) -> backdrop_io::Result<()> {
            self.inner.update_project_image(user, id, image)
        }

        fn save_processed_image(&self, user: Option<&str>, id: ProjectId, image: StorageId) -> backdrop_io::Result<()> {
            self.inner.save_processed_image(user, id, image)
        }

        fn save_layers(&self, user: Option<&str>, id: ProjectId, layers: &[TextLayer]) -> backdrop_io::Result<()> {
            if self.offline.get() {
                return Err(StoreError::Unavailable("offline".into()));
            }
            self.inner.save_layers(user, id, layers)
        }

        fn delete_project(&self, user: Option<&str>, id: ProjectId) -> backdrop_io::Result<()> {
            self.inner.delete_project(user, id)
        }
    }

    #[test]
    fn test_failed_save_keeps_local_state() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            offline: Cell::new(false),
        });
        let mut session = EditorSession::create(
            Arc::clone(&store),
            MemoryBlobs::new(),
            FontBook::new("Inter"),
            config(),
            ALICE,
            "Flaky",
            false,
        )
        .unwrap();
        let id = session.project_id();
        session.add_layer().unwrap();

        store.offline.set(true);
        session
            .update_attribute(1, LayerAttribute::Color("#ff0000".into()))
            .unwrap();
        assert!(!session.flush());
        assert_eq!(session.layers()[0].color, "#ff0000");
        let notices = session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.starts_with("Failed to save changes"));

        store.offline.set(false);
        session.add_layer().unwrap();
        let saved = store.inner.get_project(ALICE, id).unwrap().unwrap().project;
        assert_eq!(saved.text_layers.len(), 2);
        assert_eq!(saved.text_layers[0].color, "#ff0000");
    }

    #[test]
    fn test_editing_requires_identity_and_ownership() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let id = store.create_project(ALICE, "Shared", true).unwrap();

        let mut anonymous =
            EditorSession::open(Arc::clone(&store), Arc::clone(&blobs), FontBook::new("Inter"), config(), None, id)
                .unwrap();
        assert!(!anonymous.is_editable());
        assert!(matches!(anonymous.add_layer(), Err(EditorError::NotAuthenticated)));
        assert!(anonymous.layers().is_empty());

        let mut bob = EditorSession::open(
            Arc::clone(&store),
            Arc::clone(&blobs),
            FontBook::new("Inter"),
            config(),
            Some("bob"),
            id,
        )
        .unwrap();
        assert!(matches!(bob.add_layer(), Err(EditorError::ReadOnly)));

        assert!(matches!(
            EditorSession::open(store, blobs, FontBook::new("Inter"), config(), ALICE, uuid::Uuid::new_v4()),
            Err(EditorError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn test_upload_with_background_removal() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);
        let calls = Rc::new(RefCell::new(0));

        let counter = Rc::clone(&calls);
        let mut remover = move |_: &[u8]| -> std::result::Result<Vec<u8>, RemovalError> {
            *counter.borrow_mut() += 1;
            Ok(png(40, 20, [0, 255, 0, 255]))
        };
        session
            .upload_image(png(40, 20, [255, 255, 255, 255]), &mut remover)
            .unwrap();

        assert_eq!(*calls.borrow(), 1);
        let bg = session.background().unwrap();
        assert_eq!((bg.width, bg.height), (40, 20));
        assert!(session.foreground().is_some());
        let project = stored(&store, session.project_id());
        assert_eq!(project.original_image, bg.storage);
        assert_eq!(project.processed_image, session.foreground().unwrap().storage);
        assert_eq!(blobs.len(), 2);

        // Reopening picks both images up again.
        let reopened = EditorSession::open(
            Arc::clone(&store),
            Arc::clone(&blobs),
            FontBook::new("Inter"),
            config(),
            ALICE,
            session.project_id(),
        )
        .unwrap();
        assert!(reopened.background().is_some());
        assert!(reopened.foreground().is_some());
    }

    #[test]
    fn test_failed_removal_degrades() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);

        session
            .upload_image(png(40, 20, [255, 255, 255, 255]), &mut NoRemover)
            .unwrap();
        assert!(session.background().is_some());
        assert!(session.foreground().is_none());
        assert!(session.notices().any(|n| n.is_error()));
        assert!(session.export().is_ok());
    }

    #[test]
    fn test_bad_upload_is_reported() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);

        assert!(matches!(
            session.upload_image(b"not an image".to_vec(), &mut NoRemover),
            Err(EditorError::Render(_))
        ));
        assert!(session.background().is_none());
        assert!(blobs.is_empty());
    }

    #[test]
    fn test_export_needs_background() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);
        assert!(session.begin_export().is_none());
        assert!(matches!(session.export(), Err(EditorError::NoBackground)));
    }

    #[test]
    fn test_export_uses_snapshot_and_busy_flag() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);
        session
            .upload_image(png(100, 50, [255, 255, 255, 255]), &mut NoRemover)
            .unwrap();
        session.add_layer().unwrap();

        let job = session.begin_export().unwrap();
        assert!(session.is_exporting());
        assert!(session.begin_export().is_none());
        assert!(matches!(session.export(), Err(EditorError::ExportBusy)));

        session.add_layer().unwrap();
        assert_eq!(job.layers.len(), 1);

        let image = session.finish_export(job).unwrap();
        assert!(!session.is_exporting());
        assert_eq!(image.file_name, "text-behind-image.png");
        let decoded = decode_image(&image.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (100, 50));
    }

    #[test]
    fn test_picking_and_preview() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);
        let viewport = PreviewViewport::new(800.0, 400.0);
        assert!(session.preview_frame(&viewport).is_none());

        session
            .upload_image(png(1000, 800, [0, 0, 0, 255]), &mut NoRemover)
            .unwrap();
        session.add_layer().unwrap();
        session.add_layer().unwrap();

        assert_eq!(session.layer_at(&Point::new(500.0, 400.0)), Some(2));
        assert_eq!(session.select_at(&Point::new(10.0, 10.0)), None);
        assert_eq!(session.selected(), None);

        let frame = session.preview_frame(&viewport).unwrap();
        assert_eq!(frame.layers.len(), 2);
        assert!(frame.cutout.is_none());
    }

    #[test]
    fn test_drag_moves_layer() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);
        session
            .upload_image(png(400, 400, [0, 0, 0, 255]), &mut NoRemover)
            .unwrap();
        session.add_layer().unwrap();

        let viewport = PreviewViewport::new(400.0, 400.0);
        assert!(session
            .drag_layer_at(1, &viewport, 40.0, -40.0, Instant::now())
            .unwrap());
        let layer = session.layer(1).unwrap();
        assert!((layer.left - 10.0).abs() < 1e-10);
        assert!((layer.top - 10.0).abs() < 1e-10);
        assert!(session.has_pending_save());
    }

    #[test]
    fn test_observers_see_changes() {
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(MemoryBlobs::new());
        let mut session = new_session(&store, &blobs);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        session.subscribe(move |event, layers| {
            sink.borrow_mut().push((event.is_structural(), layers.len()));
        });
        session.add_layer().unwrap();
        session
            .update_attribute(1, LayerAttribute::Opacity(0.5))
            .unwrap();

        assert_eq!(*seen.borrow(), vec![(true, 1), (false, 1)]);
    }
}
