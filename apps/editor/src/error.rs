use std::io;

use backdrop_core::LayerError;
use backdrop_io::{ProjectId, StoreError};
use backdrop_render::RenderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Sign in to edit projects")]
    NotAuthenticated,

    #[error("Project {0} not found")]
    ProjectNotFound(ProjectId),

    #[error("Project is read-only for the current user")]
    ReadOnly,

    #[error("No background image to export")]
    NoBackground,

    #[error("An export is already running")]
    ExportBusy,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Layer(#[from] LayerError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EditorError>;
