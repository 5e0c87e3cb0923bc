use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use remark_core::{AttachmentFormat, Comment, ContentType};

use crate::queries::read_receipts::insert_receipt;
use crate::{not_found, Db, DbError};

/// Fields of a comment row that has passed validation.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub task_id: i64,
    pub user_id: i64,
    pub recipient_id: i64,
    pub content_type: Option<ContentType>,
    pub comment: Option<String>,
}

struct CommentRow {
    id: i64,
    task_id: i64,
    user_id: i64,
    recipient_id: i64,
    content_type: Option<String>,
    comment: Option<String>,
    attachment_extension: Option<String>,
    created_at: DateTime<Utc>,
}

const COMMENT_COLUMNS: &str = "id, task_id, user_id, recipient_id, content_type, comment, \
                               attachment_extension, created_at";

fn read_comment_row(row: &Row) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        user_id: row.get("user_id")?,
        recipient_id: row.get("recipient_id")?,
        content_type: row.get("content_type")?,
        comment: row.get("comment")?,
        attachment_extension: row.get("attachment_extension")?,
        created_at: row.get("created_at")?,
    })
}

impl TryFrom<CommentRow> for Comment {
    type Error = DbError;

    fn try_from(row: CommentRow) -> Result<Self, DbError> {
        let content_type = match row.content_type.as_deref() {
            None => None,
            Some(s) => Some(ContentType::parse_str(s).ok_or_else(|| {
                DbError::Corrupt(format!("comment {} has content type {s:?}", row.id))
            })?),
        };
        let attachment_format = match row.attachment_extension.as_deref() {
            None => None,
            Some(ext) => Some(AttachmentFormat::from_extension(ext).ok_or_else(|| {
                DbError::Corrupt(format!("comment {} has extension {ext:?}", row.id))
            })?),
        };
        Ok(Comment {
            id: row.id,
            task_id: row.task_id,
            user_id: row.user_id,
            recipient_id: row.recipient_id,
            content_type,
            comment: row.comment,
            attachment_format,
            created_at: row.created_at,
        })
    }
}

fn select_comment(conn: &Connection, id: i64) -> Result<CommentRow, DbError> {
    conn.query_row(
        &format!("SELECT {COMMENT_COLUMNS} FROM task_comments WHERE id = ?1"),
        params![id],
        read_comment_row,
    )
    .map_err(not_found(format!("comment {id}")))
}

impl Db {
    pub fn insert_comment(&self, input: &NewComment) -> Result<Comment, DbError> {
        self.insert_comment_read_by(input, &[])
    }

    /// Insert the comment and a read receipt for each of `readers` in one
    /// transaction. If any receipt fails the comment is not kept.
    pub fn insert_comment_read_by(
        &self,
        input: &NewComment,
        readers: &[i64],
    ) -> Result<Comment, DbError> {
        let row = self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO task_comments
                     (task_id, user_id, recipient_id, content_type, comment, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    input.task_id,
                    input.user_id,
                    input.recipient_id,
                    input.content_type.map(|c| c.as_str()),
                    input.comment,
                    Utc::now()
                ],
            )?;
            let id = tx.last_insert_rowid();
            for reader in readers {
                insert_receipt(&tx, *reader, id)?;
            }
            let row = select_comment(&tx, id)?;
            tx.commit()?;
            Ok(row)
        })?;
        Comment::try_from(row)
    }

    pub fn get_comment(&self, id: i64) -> Result<Comment, DbError> {
        let row = self.with_conn(|conn| select_comment(conn, id))?;
        Comment::try_from(row)
    }

    /// Comments on a task, oldest first.
    pub fn list_comments(&self, task_id: i64) -> Result<Vec<Comment>, DbError> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COMMENT_COLUMNS} FROM task_comments
                 WHERE task_id = ?1 ORDER BY created_at, id"
            ))?;
            let rows = stmt
                .query_map(params![task_id], read_comment_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;
        rows.into_iter().map(Comment::try_from).collect()
    }

    pub fn set_attachment_format(
        &self,
        id: i64,
        format: Option<AttachmentFormat>,
    ) -> Result<Comment, DbError> {
        let row = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE task_comments SET attachment_extension = ?1 WHERE id = ?2",
                params![format.map(|f| f.extension()), id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("comment {id}")));
            }
            select_comment(conn, id)
        })?;
        Comment::try_from(row)
    }

    /// Delete the comment row. Read receipts go with it via `ON DELETE CASCADE`.
    pub fn delete_comment(&self, id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM task_comments WHERE id = ?1", params![id])?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("comment {id}")));
            }
            Ok(())
        })
    }
}
