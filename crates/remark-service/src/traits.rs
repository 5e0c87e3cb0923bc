use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use remark_core::{Comment, CommentView, CreateComment, RemarkError};
use remark_db::DbError;
use remark_media::MediaError;
use remark_store::StoreError;

use crate::Upload;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Offending field names; nothing was written.
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RemarkError> for ServiceError {
    fn from(e: RemarkError) -> Self {
        match e {
            RemarkError::NotFound(msg) => ServiceError::NotFound(msg),
            RemarkError::InvalidInput(msg) => ServiceError::InvalidInput(msg),
            RemarkError::Validation(fields) => ServiceError::Validation(fields),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(msg) => ServiceError::NotFound(msg),
            DbError::Core(inner) => inner.into(),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<MediaError> for ServiceError {
    fn from(e: MediaError) -> Self {
        ServiceError::Internal(e.to_string())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::Internal(format!("io error: {e}"))
    }
}

/// Task comment operations.
///
/// `LocalCommentService` wraps a SQLite database, an attachment store and a
/// media toolkit.
#[async_trait]
pub trait CommentService: Send + Sync {
    // -- Lifecycle --
    /// Validate and persist a comment, then mark it read by its author.
    async fn create_comment(&self, input: &CreateComment) -> Result<Comment, ServiceError>;
    async fn get_comment(&self, id: i64) -> Result<Comment, ServiceError>;
    async fn list_comments(&self, task_id: i64) -> Result<Vec<Comment>, ServiceError>;
    /// Remove the attachment file, then the comment and its read receipts.
    async fn delete_comment(&self, id: i64) -> Result<(), ServiceError>;

    // -- Attachments --
    /// Convert and store an upload. `Ok(false)` means the audio could not be
    /// transcoded and nothing was changed.
    async fn add_attachment(&self, comment_id: i64, upload: Upload) -> Result<bool, ServiceError>;
    async fn attachment_path(&self, comment_id: i64) -> Result<Option<PathBuf>, ServiceError>;
    /// Bare file name of the stored attachment, e.g. `comment-42.wav`.
    async fn attachment_file_name(&self, comment_id: i64) -> Result<Option<String>, ServiceError>;
    async fn attachment_mime_type(&self, comment_id: i64) -> Result<Option<String>, ServiceError>;

    // -- Read receipts --
    async fn mark_read(&self, user_id: i64, comment_id: i64) -> Result<(), ServiceError>;
    async fn mark_unread(&self, user_id: i64, comment_id: i64) -> Result<(), ServiceError>;
    async fn is_read(&self, user_id: i64, comment_id: i64) -> Result<bool, ServiceError>;
    async fn count_read_receipts(&self, comment_id: i64) -> Result<i64, ServiceError>;
    async fn read_time(
        &self,
        user_id: i64,
        comment_id: i64,
    ) -> Result<Option<DateTime<Utc>>, ServiceError>;

    // -- Views --
    async fn serialize(&self, comment_id: i64, viewer_id: i64) -> Result<CommentView, ServiceError>;
    async fn serialize_task(
        &self,
        task_id: i64,
        viewer_id: i64,
    ) -> Result<Vec<CommentView>, ServiceError>;
}
