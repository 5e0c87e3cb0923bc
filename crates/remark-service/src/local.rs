use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use remark_core::{AttachmentFormat, Comment, CommentView, CreateComment, RemarkError};
use remark_db::queries::comments::NewComment;
use remark_db::Db;
use remark_media::{sniff, MediaToolkit};
use remark_store::{attachment_file_name, comment_attachment_key, ObjectStore};

use crate::{
    AttachmentProcessor, CommentSerializer, CommentService, Converted, ReadReceiptTracker,
    ServiceError, Upload, WAV_MIME_TYPE,
};

/// Local implementation backed by SQLite and an attachment store.
pub struct LocalCommentService {
    db: Db,
    store: Arc<dyn ObjectStore>,
    tracker: ReadReceiptTracker,
    processor: AttachmentProcessor,
    serializer: CommentSerializer,
}

impl LocalCommentService {
    pub fn new(db: Db, store: Arc<dyn ObjectStore>, toolkit: Arc<dyn MediaToolkit>) -> Self {
        let tracker = ReadReceiptTracker::new(db.clone());
        Self {
            processor: AttachmentProcessor::new(toolkit),
            serializer: CommentSerializer::new(db.clone(), tracker.clone()),
            tracker,
            store,
            db,
        }
    }

    /// Referenced rows that do not exist, by field name.
    fn missing_references(&self, input: &CreateComment) -> Result<Vec<String>, ServiceError> {
        let mut missing = Vec::new();
        if let Some(id) = input.recipient_id {
            if !self.db.user_exists(id)? {
                missing.push("recipient_id".to_string());
            }
        }
        if let Some(id) = input.task_id {
            if !self.db.task_exists(id)? {
                missing.push("task_id".to_string());
            }
        }
        if let Some(id) = input.user_id {
            if !self.db.user_exists(id)? {
                missing.push("user_id".to_string());
            }
        }
        Ok(missing)
    }

    fn stored_key(comment: &Comment) -> Option<String> {
        comment
            .attachment_format
            .map(|format| comment_attachment_key(comment.id, format))
    }

    /// Place a converted file and record its format so that the row never
    /// points at a missing file.
    ///
    /// A new format is placed under its own key before the row is updated;
    /// if the update fails that key is removed again. A re-upload in the
    /// current format would overwrite the file the row already points at,
    /// so there the row is updated first and the file replaced afterwards.
    async fn commit_attachment(
        &self,
        comment: &Comment,
        converted: &Converted,
    ) -> Result<(), ServiceError> {
        let format = converted.format;
        let key = comment_attachment_key(comment.id, format);

        if comment.attachment_format == Some(format) {
            self.db.set_attachment_format(comment.id, Some(format))?;
            self.store.put_file(&key, converted.path()).await?;
            info!("replaced {format} attachment for comment {}", comment.id);
            return Ok(());
        }

        self.store.put_file(&key, converted.path()).await?;
        if let Err(e) = self.db.set_attachment_format(comment.id, Some(format)) {
            warn!("rolling back attachment for comment {}: {e}", comment.id);
            self.store.delete(&key).await?;
            return Err(e.into());
        }

        // A previous upload in a different format is now unreferenced.
        if let Some(old) = comment.attachment_format {
            self.store
                .delete(&comment_attachment_key(comment.id, old))
                .await?;
        }
        info!("stored {format} attachment for comment {}", comment.id);
        Ok(())
    }
}

#[async_trait]
impl CommentService for LocalCommentService {
    async fn create_comment(&self, input: &CreateComment) -> Result<Comment, ServiceError> {
        let mut invalid = match input.check() {
            Ok(()) => Vec::new(),
            Err(RemarkError::Validation(fields)) => fields,
            Err(other) => return Err(other.into()),
        };
        invalid.extend(self.missing_references(input)?);
        invalid.sort();
        invalid.dedup();
        if !invalid.is_empty() {
            return Err(ServiceError::Validation(invalid));
        }

        let (Some(task_id), Some(user_id), Some(recipient_id)) =
            (input.task_id, input.user_id, input.recipient_id)
        else {
            return Err(ServiceError::Internal("validated comment lost a reference".into()));
        };

        // The author never sees their own comment as new. Their receipt, and
        // the staff fan-out when the author is the main tutor, is written in
        // the same transaction as the comment.
        let ctx = self.db.task_context(task_id)?;
        let readers = self.tracker.readers(user_id, &ctx)?;
        let comment = self.db.insert_comment_read_by(
            &NewComment {
                task_id,
                user_id,
                recipient_id,
                content_type: input.content_type,
                comment: input.comment.clone(),
            },
            &readers,
        )?;
        info!("created comment {} on task {task_id}", comment.id);
        Ok(comment)
    }

    async fn get_comment(&self, id: i64) -> Result<Comment, ServiceError> {
        Ok(self.db.get_comment(id)?)
    }

    async fn list_comments(&self, task_id: i64) -> Result<Vec<Comment>, ServiceError> {
        Ok(self.db.list_comments(task_id)?)
    }

    async fn delete_comment(&self, id: i64) -> Result<(), ServiceError> {
        let comment = self.db.get_comment(id)?;
        if let Some(key) = Self::stored_key(&comment) {
            if self.store.exists(&key).await? {
                self.store.delete(&key).await?;
            }
        }
        self.db.delete_comment(id)?;
        info!("deleted comment {id}");
        Ok(())
    }

    async fn add_attachment(&self, comment_id: i64, upload: Upload) -> Result<bool, ServiceError> {
        let comment = self.db.get_comment(comment_id)?;
        let Some(converted) = self.processor.convert(&comment, upload).await? else {
            return Ok(false);
        };
        self.commit_attachment(&comment, &converted).await?;
        Ok(true)
    }

    async fn attachment_file_name(&self, comment_id: i64) -> Result<Option<String>, ServiceError> {
        let comment = self.db.get_comment(comment_id)?;
        Ok(comment
            .attachment_format
            .map(|format| attachment_file_name(comment.id, format)))
    }

    async fn attachment_path(&self, comment_id: i64) -> Result<Option<PathBuf>, ServiceError> {
        let comment = self.db.get_comment(comment_id)?;
        Ok(Self::stored_key(&comment).and_then(|key| self.store.local_path(&key)))
    }

    async fn attachment_mime_type(&self, comment_id: i64) -> Result<Option<String>, ServiceError> {
        let comment = self.db.get_comment(comment_id)?;
        match comment.attachment_format {
            None => Ok(None),
            Some(AttachmentFormat::Wav) => Ok(Some(WAV_MIME_TYPE.to_string())),
            Some(format) => {
                let key = comment_attachment_key(comment.id, format);
                let path = self.store.local_path(&key).ok_or_else(|| {
                    ServiceError::Internal(format!("no local path for {key}"))
                })?;
                Ok(Some(sniff::mime_or_octet_stream(&path)?.to_string()))
            }
        }
    }

    async fn mark_read(&self, user_id: i64, comment_id: i64) -> Result<(), ServiceError> {
        self.tracker.mark_read(user_id, comment_id)
    }

    async fn mark_unread(&self, user_id: i64, comment_id: i64) -> Result<(), ServiceError> {
        self.tracker.mark_unread(user_id, comment_id)
    }

    async fn is_read(&self, user_id: i64, comment_id: i64) -> Result<bool, ServiceError> {
        self.tracker.is_read(user_id, comment_id)
    }

    async fn count_read_receipts(&self, comment_id: i64) -> Result<i64, ServiceError> {
        Ok(self.db.count_read_receipts(comment_id)?)
    }

    async fn read_time(
        &self,
        user_id: i64,
        comment_id: i64,
    ) -> Result<Option<DateTime<Utc>>, ServiceError> {
        self.tracker.read_time(user_id, comment_id)
    }

    async fn serialize(&self, comment_id: i64, viewer_id: i64) -> Result<CommentView, ServiceError> {
        let comment = self.db.get_comment(comment_id)?;
        self.serializer.serialize(&comment, viewer_id)
    }

    async fn serialize_task(
        &self,
        task_id: i64,
        viewer_id: i64,
    ) -> Result<Vec<CommentView>, ServiceError> {
        self.db
            .list_comments(task_id)?
            .iter()
            .map(|comment| self.serializer.serialize(comment, viewer_id))
            .collect()
    }
}

