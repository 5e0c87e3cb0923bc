use remark_core::{Comment, CommentView, PersonView};
use remark_db::Db;

use crate::{ReadReceiptTracker, ServiceError};

/// Projects a comment into the view a particular user receives.
#[derive(Clone)]
pub struct CommentSerializer {
    db: Db,
    tracker: ReadReceiptTracker,
}

impl CommentSerializer {
    pub fn new(db: Db, tracker: ReadReceiptTracker) -> Self {
        Self { db, tracker }
    }

    pub fn serialize(&self, comment: &Comment, viewer_id: i64) -> Result<CommentView, ServiceError> {
        let author = self.db.get_user(comment.user_id)?;
        let recipient = self.db.get_user(comment.recipient_id)?;

        Ok(CommentView {
            id: comment.id,
            comment: comment.display_text(),
            has_attachment: comment.has_attachment(),
            kind: comment.kind(),
            is_new: !self.tracker.is_read(viewer_id, comment.id)?,
            author: PersonView {
                id: author.id,
                name: author.name,
                email: author.email.clone(),
            },
            // Clients have always received the author's email here.
            recipient: PersonView {
                id: recipient.id,
                name: recipient.name,
                email: author.email,
            },
            created_at: comment.created_at,
            recipient_read_time: self.tracker.read_time(comment.recipient_id, comment.id)?,
        })
    }
}
