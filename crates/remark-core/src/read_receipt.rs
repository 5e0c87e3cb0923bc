use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record that `user_id` has seen `comment_id`. `created_at` is the read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub user_id: i64,
    pub comment_id: i64,
    pub created_at: DateTime<Utc>,
}
