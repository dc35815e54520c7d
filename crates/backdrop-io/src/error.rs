use std::io;

use thiserror::Error;

use crate::project::ProjectId;
use crate::upload::StorageId;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Project not found or not authorized")]
    NotAuthorized,

    #[error("Not authorized to view project {0}")]
    NotVisible(ProjectId),

    #[error("Upload target is unknown or already used")]
    UploadTargetInvalid,

    #[error("No stored file {0}")]
    StorageNotFound(StorageId),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid project document: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Errors the caller cannot fix by retrying.
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            StoreError::NotAuthenticated | StoreError::NotAuthorized | StoreError::NotVisible(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
