use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content_type::ContentType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonView {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// A comment as seen by one particular viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub comment: Option<String>,
    pub has_attachment: bool,
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub is_new: bool,
    pub author: PersonView,
    pub recipient: PersonView,
    pub created_at: DateTime<Utc>,
    pub recipient_read_time: Option<DateTime<Utc>>,
}
