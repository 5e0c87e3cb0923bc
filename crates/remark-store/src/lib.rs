mod local;

pub use local::LocalStore;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use remark_core::AttachmentFormat;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Internal(String),
}

/// A store for attachment files keyed by string paths.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write (create or overwrite) an object.
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

    /// Move a finished file into the store under `key`, replacing any
    /// existing object. `src` no longer exists afterwards.
    async fn put_file(&self, key: &str, src: &Path) -> Result<(), StoreError>;

    /// Read an object. Returns `StoreError::NotFound` if absent.
    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Read an object, returning `None` if it does not exist.
    async fn get_opt(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        match self.get(key).await {
            Ok(data) => Ok(Some(data)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete an object. No-op if absent.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Filesystem location of `key`, for backends that have one.
    fn local_path(&self, key: &str) -> Option<PathBuf>;
}

// -- Key helpers --

/// Stored file name of a comment's attachment, e.g. `comment-42.wav`.
pub fn attachment_file_name(comment_id: i64, format: AttachmentFormat) -> String {
    format!("comment-{comment_id}{}", format.extension())
}

/// Canonical store key of a comment's attachment. Pure and collision-free
/// across comment ids.
pub fn comment_attachment_key(comment_id: i64, format: AttachmentFormat) -> String {
    format!("comments/{}", attachment_file_name(comment_id, format))
}

// -- Configuration --

/// Configuration for the attachment store.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Base directory for attachment files. When `None`, use the default
    /// data directory.
    pub local_data_dir: Option<String>,
}

impl StoreConfig {
    /// Build from `REMARK_ATTACHMENT_DIR`.
    pub fn from_env() -> Self {
        Self {
            local_data_dir: std::env::var("REMARK_ATTACHMENT_DIR").ok(),
        }
    }
}

// -- Factory --

pub fn create_store(config: &StoreConfig) -> Arc<dyn ObjectStore> {
    Arc::new(LocalStore::new(config))
}
