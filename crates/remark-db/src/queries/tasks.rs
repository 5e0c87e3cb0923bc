use chrono::Utc;
use rusqlite::{params, Row};

use remark_core::context::{CommentContext, CreateTask, Task};
use remark_core::task_status::verify_status_table;
use remark_core::TaskStatus;

use crate::{not_found, Db, DbError};

struct TaskRow {
    id: i64,
    project_id: i64,
    name: String,
    status_id: i64,
}

fn read_task_row(row: &Row) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        name: row.get("name")?,
        status_id: row.get("status_id")?,
    })
}

fn read_context(r: &Row) -> rusqlite::Result<CommentContext> {
    Ok(CommentContext {
        task_id: r.get(0)?,
        project_id: r.get(1)?,
        unit_id: r.get(2)?,
        main_tutor_id: r.get(3)?,
    })
}

impl TryFrom<TaskRow> for Task {
    type Error = DbError;

    fn try_from(row: TaskRow) -> Result<Self, DbError> {
        let status = TaskStatus::from_id(row.status_id).ok_or_else(|| {
            DbError::Corrupt(format!("task {} has unknown status id {}", row.id, row.status_id))
        })?;
        Ok(Task {
            id: row.id,
            project_id: row.project_id,
            name: row.name,
            status,
        })
    }
}

impl Db {
    pub fn create_task(&self, input: &CreateTask) -> Result<Task, DbError> {
        let row = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (project_id, name, status_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![input.project_id, input.name, input.status.id(), Utc::now()],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                "SELECT id, project_id, name, status_id FROM tasks WHERE id = ?1",
                params![id],
                read_task_row,
            )?;
            Ok(row)
        })?;
        Task::try_from(row)
    }

    pub fn get_task(&self, id: i64) -> Result<Task, DbError> {
        let row = self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, project_id, name, status_id FROM tasks WHERE id = ?1",
                params![id],
                read_task_row,
            )
            .map_err(not_found(format!("task {id}")))
        })?;
        Task::try_from(row)
    }

    pub fn task_exists(&self, id: i64) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT count(*) FROM tasks WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn update_task_status(&self, id: i64, status: TaskStatus) -> Result<Task, DbError> {
        let changed = self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE tasks SET status_id = ?1 WHERE id = ?2",
                params![status.id(), id],
            )?)
        })?;
        if changed == 0 {
            return Err(DbError::NotFound(format!("task {id}")));
        }
        self.get_task(id)
    }

    /// Persisted `(id, name)` rows of the status table.
    pub fn list_task_status_rows(&self) -> Result<Vec<(i64, String)>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM task_statuses ORDER BY id")?;
            let rows = stmt
                .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
                .collect::<Result<Vec<(i64, String)>, _>>()?;
            Ok(rows)
        })
    }

    /// Fail unless the status table matches `TaskStatus` exactly.
    pub fn verify_task_statuses(&self) -> Result<(), DbError> {
        let rows = self.list_task_status_rows()?;
        verify_status_table(&rows)?;
        Ok(())
    }

    /// Resolve task → project → unit for a comment that is about to be
    /// written on `task_id`.
    pub fn task_context(&self, task_id: i64) -> Result<CommentContext, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT t.id, p.id, p.unit_id, p.main_tutor_id
                 FROM tasks t
                 JOIN projects p ON p.id = t.project_id
                 WHERE t.id = ?1",
                params![task_id],
                read_context,
            )
            .map_err(not_found(format!("task {task_id}")))
        })
    }

    /// Resolve task → project → unit for a comment.
    pub fn comment_context(&self, comment_id: i64) -> Result<CommentContext, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT t.id, p.id, p.unit_id, p.main_tutor_id
                 FROM task_comments c
                 JOIN tasks t ON t.id = c.task_id
                 JOIN projects p ON p.id = t.project_id
                 WHERE c.id = ?1",
                params![comment_id],
                read_context,
            )
            .map_err(not_found(format!("comment {comment_id}")))
        })
    }
}
