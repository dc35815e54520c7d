//! # Backdrop Editor
//!
//! The text-behind-image editing session: layer edits with coalesced saves,
//! image upload with background removal, live preview frames and PNG export.

pub mod background;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod notify;
pub mod session;

pub use background::{BackgroundRemover, NoRemover, RemovalError};
pub use config::EditorConfig;
pub use error::{EditorError, Result};
pub use notify::{Notice, NoticeLevel};
pub use session::{EditorSession, ExportJob, ExportedImage, ImageAsset};
