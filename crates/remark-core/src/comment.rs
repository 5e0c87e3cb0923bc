use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::content_type::{AttachmentFormat, ContentType};
use crate::error::RemarkError;

/// Maximum length of a stored comment body, in characters.
pub const MAX_COMMENT_CHARS: u64 = 4095;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
    pub recipient_id: i64,
    pub content_type: Option<ContentType>,
    pub comment: Option<String>,
    pub attachment_format: Option<AttachmentFormat>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Content type with unset treated as text.
    pub fn kind(&self) -> ContentType {
        self.content_type.unwrap_or(ContentType::Text)
    }

    pub fn has_attachment(&self) -> bool {
        self.kind().has_attachment()
    }

    /// Text shown to clients: the fixed label for media and discussion
    /// comments, the stored body otherwise.
    pub fn display_text(&self) -> Option<String> {
        match self.kind().display_label() {
            Some(label) => Some(label.to_string()),
            None => self.comment.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateComment {
    #[validate(required(message = "task must be present"))]
    pub task_id: Option<i64>,

    #[validate(required(message = "user must be present"))]
    pub user_id: Option<i64>,

    #[validate(required(message = "recipient must be present"))]
    pub recipient_id: Option<i64>,

    #[serde(default)]
    pub content_type: Option<ContentType>,

    #[serde(default)]
    #[validate(length(max = 4095, message = "comment must not exceed 4095 characters"))]
    pub comment: Option<String>,
}

impl CreateComment {
    pub fn text(task_id: i64, user_id: i64, recipient_id: i64, body: &str) -> Self {
        Self {
            task_id: Some(task_id),
            user_id: Some(user_id),
            recipient_id: Some(recipient_id),
            content_type: Some(ContentType::Text),
            comment: Some(body.to_string()),
        }
    }

    pub fn media(task_id: i64, user_id: i64, recipient_id: i64, kind: ContentType) -> Self {
        Self {
            task_id: Some(task_id),
            user_id: Some(user_id),
            recipient_id: Some(recipient_id),
            content_type: Some(kind),
            comment: None,
        }
    }

    /// Run field validation, reporting every offending field by name.
    pub fn check(&self) -> Result<(), RemarkError> {
        self.validate().map_err(|errors| {
            let mut fields: Vec<String> = errors
                .field_errors()
                .keys()
                .map(|field| field.to_string())
                .collect();
            fields.sort();
            RemarkError::Validation(fields)
        })
    }
}
