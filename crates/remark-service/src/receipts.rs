use chrono::{DateTime, Utc};
use tracing::{debug, info};

use remark_core::context::CommentContext;
use remark_db::Db;

use crate::ServiceError;

/// Tracks which users have seen which comments.
///
/// A read by the project's main tutor counts for the whole unit staff: every
/// staff member gets a receipt. All writes are find-or-create, so a fan-out
/// interrupted part way converges when repeated.
#[derive(Clone)]
pub struct ReadReceiptTracker {
    db: Db,
}

impl ReadReceiptTracker {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn mark_read(&self, user_id: i64, comment_id: i64) -> Result<(), ServiceError> {
        if self.is_read(user_id, comment_id)? {
            return Ok(());
        }

        let ctx = self.db.comment_context(comment_id)?;
        let readers = self.readers(user_id, &ctx)?;
        for reader in &readers {
            self.db.upsert_read_receipt(*reader, comment_id)?;
        }
        if readers.len() > 1 {
            info!(
                "main tutor {user_id} read comment {comment_id}; marked read for {} staff in unit {}",
                readers.len(),
                ctx.unit_id
            );
        } else {
            debug!("user {user_id} read comment {comment_id}");
        }
        Ok(())
    }

    /// Users who get a receipt when `user_id` reads a comment in `ctx`: the
    /// whole unit staff for the main tutor, otherwise just `user_id`.
    pub fn readers(&self, user_id: i64, ctx: &CommentContext) -> Result<Vec<i64>, ServiceError> {
        if !ctx.is_supervisor(user_id) {
            return Ok(vec![user_id]);
        }
        let mut staff = self.db.list_unit_staff(ctx.unit_id)?;
        if !staff.contains(&user_id) {
            staff.push(user_id);
        }
        Ok(staff)
    }

    /// Remove only this user's receipt.
    pub fn mark_unread(&self, user_id: i64, comment_id: i64) -> Result<(), ServiceError> {
        self.db.delete_read_receipt(user_id, comment_id)?;
        Ok(())
    }

    pub fn is_read(&self, user_id: i64, comment_id: i64) -> Result<bool, ServiceError> {
        Ok(self.db.find_read_receipt(user_id, comment_id)?.is_some())
    }

    pub fn read_time(
        &self,
        user_id: i64,
        comment_id: i64,
    ) -> Result<Option<DateTime<Utc>>, ServiceError> {
        Ok(self
            .db
            .find_read_receipt(user_id, comment_id)?
            .map(|r| r.created_at))
    }
}
