use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use remark_core::ReadReceipt;

use crate::{Db, DbError};

fn row_to_receipt(row: &Row) -> rusqlite::Result<ReadReceipt> {
    Ok(ReadReceipt {
        user_id: row.get("user_id")?,
        comment_id: row.get("task_comment_id")?,
        created_at: row.get("created_at")?,
    })
}

pub(crate) fn insert_receipt(
    conn: &Connection,
    user_id: i64,
    comment_id: i64,
) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO comments_read_receipts (task_comment_id, user_id, created_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (user_id, task_comment_id) DO NOTHING",
        params![comment_id, user_id, Utc::now()],
    )?;
    Ok(())
}

impl Db {
    /// Find-or-create. An existing receipt keeps its original read time.
    pub fn upsert_read_receipt(&self, user_id: i64, comment_id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| insert_receipt(conn, user_id, comment_id))
    }

    pub fn find_read_receipt(
        &self,
        user_id: i64,
        comment_id: i64,
    ) -> Result<Option<ReadReceipt>, DbError> {
        self.with_conn(|conn| {
            let receipt = conn
                .query_row(
                    "SELECT user_id, task_comment_id, created_at FROM comments_read_receipts
                     WHERE user_id = ?1 AND task_comment_id = ?2",
                    params![user_id, comment_id],
                    row_to_receipt,
                )
                .optional()?;
            Ok(receipt)
        })
    }

    /// Returns the number of receipts removed (0 or 1).
    pub fn delete_read_receipt(&self, user_id: i64, comment_id: i64) -> Result<usize, DbError> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM comments_read_receipts WHERE user_id = ?1 AND task_comment_id = ?2",
                params![user_id, comment_id],
            )?;
            Ok(removed)
        })
    }

    pub fn list_read_receipts(&self, comment_id: i64) -> Result<Vec<ReadReceipt>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, task_comment_id, created_at FROM comments_read_receipts
                 WHERE task_comment_id = ?1 ORDER BY user_id",
            )?;
            let receipts = stmt
                .query_map(params![comment_id], row_to_receipt)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(receipts)
        })
    }

    pub fn count_read_receipts(&self, comment_id: i64) -> Result<i64, DbError> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT count(*) FROM comments_read_receipts WHERE task_comment_id = ?1",
                params![comment_id],
                |r| r.get(0),
            )?;
            Ok(count)
        })
    }
}
