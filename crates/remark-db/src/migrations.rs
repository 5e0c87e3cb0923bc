use rusqlite::{params, Connection};
use tracing::info;

use remark_core::TaskStatus;

use crate::DbError;

pub fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )?;

    let current_version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if current_version < 1 {
        info!("applying schema v1");
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS units (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                code        TEXT NOT NULL UNIQUE,
                name        TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS unit_staff (
                unit_id     INTEGER NOT NULL REFERENCES units(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (unit_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS projects (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                unit_id       INTEGER NOT NULL REFERENCES units(id) ON DELETE CASCADE,
                student_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                main_tutor_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                created_at    TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_projects_unit ON projects(unit_id);

            CREATE TABLE IF NOT EXISTS task_statuses (
                id          INTEGER PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                key         TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id  INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                name        TEXT NOT NULL,
                status_id   INTEGER NOT NULL DEFAULT 1 REFERENCES task_statuses(id),
                created_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);

            CREATE TABLE IF NOT EXISTS task_comments (
                id                   INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id              INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                user_id              INTEGER NOT NULL REFERENCES users(id),
                recipient_id         INTEGER NOT NULL REFERENCES users(id),
                content_type         TEXT CHECK(content_type IN (
                                         'text', 'audio', 'image', 'pdf', 'discussion'
                                     )),
                comment              TEXT CHECK(comment IS NULL OR length(comment) <= 4095),
                attachment_extension TEXT CHECK(attachment_extension IN (
                                         '.wav', '.gif', '.jpg', '.pdf'
                                     )),
                created_at           TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_task_comments_task ON task_comments(task_id);

            CREATE TABLE IF NOT EXISTS comments_read_receipts (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                task_comment_id INTEGER NOT NULL REFERENCES task_comments(id) ON DELETE CASCADE,
                user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at      TEXT NOT NULL,
                UNIQUE (user_id, task_comment_id)
            );
            CREATE INDEX IF NOT EXISTS idx_read_receipts_comment
                ON comments_read_receipts(task_comment_id);
            ",
        )?;
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (1, datetime('now'))",
            [],
        )?;
    }

    seed_task_statuses(conn)?;

    Ok(())
}

/// Insert any status rows that are missing. Existing rows are left alone so
/// that drift is caught by verification rather than silently overwritten.
fn seed_task_statuses(conn: &Connection) -> Result<(), DbError> {
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO task_statuses (id, name, key) VALUES (?1, ?2, ?3)")?;
    for status in TaskStatus::ALL {
        stmt.execute(params![status.id(), status.display_name(), status.key()])?;
    }
    Ok(())
}
