use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use backdrop_core::TextLayer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::upload::StorageId;

/// Unique project identifier.
pub type ProjectId = Uuid;

/// Opaque identity supplied by the auth provider.
pub type UserId = String;

/// A persisted project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub user_id: UserId,
    pub title: String,
    pub is_public: bool,
    pub original_image: Option<StorageId>,
    pub processed_image: Option<StorageId>,
    /// Drawn in order; the last entry is on top.
    pub text_layers: Vec<TextLayer>,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    pub updated_at: u64,
}

impl Project {
    pub fn new(user_id: &str, title: &str, is_public: bool) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            is_public,
            original_image: None,
            processed_image: None,
            text_layers: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user: Option<&str>) -> bool {
        user == Some(self.user_id.as_str())
    }

    pub fn is_visible_to(&self, user: Option<&str>) -> bool {
        self.is_public || self.is_owned_by(user)
    }

    pub fn touch(&mut self) {
        self.updated_at = now_millis().max(self.updated_at);
    }
}

/// A project as seen by a particular caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    /// Whether the caller may edit it.
    pub is_owner: bool,
}

/// The on-disk project file used by the command-line tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub text_layers: Vec<TextLayer>,
}

impl ProjectDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let doc = Self::from_json(&json)?;
        log::info!(
            "Loaded project '{}' with {} layers from {}",
            doc.title,
            doc.text_layers.len(),
            path.display()
        );
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl From<&Project> for ProjectDocument {
    fn from(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            is_public: project.is_public,
            text_layers: project.text_layers.clone(),
        }
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
