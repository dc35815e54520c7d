//! Project persistence: the contract the editor saves through and an
//! in-process implementation of it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use backdrop_core::TextLayer;

use crate::error::{Result, StoreError};
use crate::project::{Project, ProjectId, ProjectView};
use crate::upload::StorageId;

/// Maximum number of projects on the public listing.
pub const PUBLIC_PROJECT_LIMIT: usize = 20;

/// Project CRUD guarded by the caller's identity. `user` is `None` for an
/// anonymous caller. Every mutation requires an identity and ownership.
pub trait ProjectStore {
    fn create_project(&self, user: Option<&str>, title: &str, is_public: bool) -> Result<ProjectId>;

    /// `Ok(None)` when no such project exists.
    fn get_project(&self, user: Option<&str>, id: ProjectId) -> Result<Option<ProjectView>>;

    /// The caller's projects, newest first.
    fn list_user_projects(&self, user: Option<&str>) -> Result<Vec<Project>>;

    /// Up to [`PUBLIC_PROJECT_LIMIT`] public projects, newest first.
    fn list_public_projects(&self) -> Result<Vec<Project>>;

    fn update_project_image(&self, user: Option<&str>, id: ProjectId, image: StorageId) -> Result<()>;

    fn save_processed_image(&self, user: Option<&str>, id: ProjectId, image: StorageId) -> Result<()>;

    /// Overwrites the whole layer array.
    fn save_layers(&self, user: Option<&str>, id: ProjectId, layers: &[TextLayer]) -> Result<()>;

    fn delete_project(&self, user: Option<&str>, id: ProjectId) -> Result<()>;
}

/// A shared backend serves every session that holds a handle to it.
impl<T: ProjectStore + ?Sized> ProjectStore for Arc<T> {
    fn create_project(&self, user: Option<&str>, title: &str, is_public: bool) -> Result<ProjectId> {
        (**self).create_project(user, title, is_public)
    }

    fn get_project(&self, user: Option<&str>, id: ProjectId) -> Result<Option<ProjectView>> {
        (**self).get_project(user, id)
    }

    fn list_user_projects(&self, user: Option<&str>) -> Result<Vec<Project>> {
        (**self).list_user_projects(user)
    }

    fn list_public_projects(&self) -> Result<Vec<Project>> {
        (**self).list_public_projects()
    }

    fn update_project_image(&self, user: Option<&str>, id: ProjectId, image: StorageId) -> Result<()> {
        (**self).update_project_image(user, id, image)
    }

    fn save_processed_image(&self, user: Option<&str>, id: ProjectId, image: StorageId) -> Result<()> {
        (**self).save_processed_image(user, id, image)
    }

    fn save_layers(&self, user: Option<&str>, id: ProjectId, layers: &[TextLayer]) -> Result<()> {
        (**self).save_layers(user, id, layers)
    }

    fn delete_project(&self, user: Option<&str>, id: ProjectId) -> Result<()> {
        (**self).delete_project(user, id)
    }
}

#[derive(Default)]
struct StoreState {
    projects: HashMap<ProjectId, (u64, Project)>,
    next_seq: u64,
}

impl StoreState {
    /// Newest first; insertion order breaks timestamp ties.
    fn sorted<'a>(&'a self, filter: impl Fn(&Project) -> bool) -> Vec<&'a (u64, Project)> {
        let mut entries: Vec<&(u64, Project)> =
            self.projects.values().filter(|(_, p)| filter(p)).collect();
        entries.sort_by(|(sa, a), (sb, b)| b.created_at.cmp(&a.created_at).then(sb.cmp(sa)));
        entries
    }

    fn owned_mut(&mut self, user: Option<&str>, id: ProjectId) -> Result<&mut Project> {
        let user = user.ok_or(StoreError::NotAuthenticated)?;
        match self.projects.get_mut(&id) {
            Some((_, project)) if project.is_owned_by(Some(user)) => Ok(project),
            _ => Err(StoreError::NotAuthorized),
        }
    }
}

/// In-process project store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn patch(
        &self,
        user: Option<&str>,
        id: ProjectId,
        apply: impl FnOnce(&mut Project),
    ) -> Result<()> {
        let mut state = self.lock()?;
        let project = state.owned_mut(user, id)?;
        apply(&mut *project);
        project.touch();
        Ok(())
    }
}

impl ProjectStore for MemoryStore {
    fn create_project(&self, user: Option<&str>, title: &str, is_public: bool) -> Result<ProjectId> {
        let user = user.ok_or(StoreError::NotAuthenticated)?;
        let project = Project::new(user, title, is_public);
        let id = project.id;

        let mut state = self.lock()?;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.projects.insert(id, (seq, project));
        log::info!("Created project {} for {}", id, user);
        Ok(id)
    }

    fn get_project(&self, user: Option<&str>, id: ProjectId) -> Result<Option<ProjectView>> {
        let state = self.lock()?;
        let Some((_, project)) = state.projects.get(&id) else {
            return Ok(None);
        };
        if !project.is_visible_to(user) {
            return Err(StoreError::NotVisible(id));
        }
        Ok(Some(ProjectView {
            is_owner: project.is_owned_by(user),
            project: project.clone(),
        }))
    }

    fn list_user_projects(&self, user: Option<&str>) -> Result<Vec<Project>> {
        let user = user.ok_or(StoreError::NotAuthenticated)?;
        let state = self.lock()?;
        Ok(state
            .sorted(|p| p.user_id == user)
            .into_iter()
            .map(|(_, p)| p.clone())
            .collect())
    }

    fn list_public_projects(&self) -> Result<Vec<Project>> {
        let state = self.lock()?;
        Ok(state
            .sorted(|p| p.is_public)
            .into_iter()
            .take(PUBLIC_PROJECT_LIMIT)
            .map(|(_, p)| p.clone())
            .collect())
    }

    fn update_project_image(&self, user: Option<&str>, id: ProjectId, image: StorageId) -> Result<()> {
        self.patch(user, id, |p| p.original_image = Some(image))
    }

    fn save_processed_image(&self, user: Option<&str>, id: ProjectId, image: StorageId) -> Result<()> {
        self.patch(user, id, |p| p.processed_image = Some(image))
    }

    fn save_layers(&self, user: Option<&str>, id: ProjectId, layers: &[TextLayer]) -> Result<()> {
        self.patch(user, id, |p| p.text_layers = layers.to_vec())?;
        log::debug!("Saved {} layers to project {}", layers.len(), id);
        Ok(())
    }

    fn delete_project(&self, user: Option<&str>, id: ProjectId) -> Result<()> {
        let mut state = self.lock()?;
        state.owned_mut(user, id)?;
        state.projects.remove(&id);
        log::info!("Deleted project {}", id);
        Ok(())
    }
}
