//! # Backdrop I/O
//!
//! Project persistence and image storage for the editor: the store and upload
//! contracts, in-memory implementations of both, and the JSON project
//! document read and written by the command-line tool.

pub mod error;
pub mod project;
pub mod store;
pub mod upload;

pub use error::{Result, StoreError};
pub use project::{Project, ProjectDocument, ProjectId, ProjectView, UserId};
pub use store::{MemoryStore, ProjectStore, PUBLIC_PROJECT_LIMIT};
pub use upload::{MemoryBlobs, StorageId, UploadService, UploadTarget};
