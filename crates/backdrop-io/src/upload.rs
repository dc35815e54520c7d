use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// Reference to a stored file.
pub type StorageId = Uuid;

/// A single-use destination for raw file bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    pub token: Uuid,
    pub url: String,
}

/// Object storage for uploaded images.
pub trait UploadService {
    /// Requires an authenticated caller.
    fn request_upload_target(&self, user: Option<&str>) -> Result<UploadTarget>;

    /// Write bytes to a target. Each target accepts exactly one upload.
    fn upload(&self, target: &UploadTarget, bytes: Vec<u8>) -> Result<StorageId>;

    fn fetch(&self, id: StorageId) -> Result<Vec<u8>>;
}

impl<T: UploadService + ?Sized> UploadService for Arc<T> {
    fn request_upload_target(&self, user: Option<&str>) -> Result<UploadTarget> {
        (**self).request_upload_target(user)
    }

    fn upload(&self, target: &UploadTarget, bytes: Vec<u8>) -> Result<StorageId> {
        (**self).upload(target, bytes)
    }

    fn fetch(&self, id: StorageId) -> Result<Vec<u8>> {
        (**self).fetch(id)
    }
}

#[derive(Default)]
struct BlobState {
    pending: HashSet<Uuid>,
    blobs: HashMap<StorageId, Vec<u8>>,
}

/// In-process blob storage.
#[derive(Default)]
pub struct MemoryBlobs {
    state: Mutex<BlobState>,
}

impl MemoryBlobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BlobState>> {
        self.state
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl UploadService for MemoryBlobs {
    fn request_upload_target(&self, user: Option<&str>) -> Result<UploadTarget> {
        if user.is_none() {
            return Err(StoreError::NotAuthenticated);
        }
        let token = Uuid::new_v4();
        self.lock()?.pending.insert(token);
        Ok(UploadTarget {
            token,
            url: format!("memory://upload/{}", token),
        })
    }

    fn upload(&self, target: &UploadTarget, bytes: Vec<u8>) -> Result<StorageId> {
        let mut state = self.lock()?;
        if !state.pending.remove(&target.token) {
            return Err(StoreError::UploadTargetInvalid);
        }
        let id = Uuid::new_v4();
        log::debug!("Stored {} bytes as {}", bytes.len(), id);
        state.blobs.insert(id, bytes);
        Ok(id)
    }

    fn fetch(&self, id: StorageId) -> Result<Vec<u8>> {
        self.lock()?
            .blobs
            .get(&id)
            .cloned()
            .ok_or(StoreError::StorageNotFound(id))
    }
}
