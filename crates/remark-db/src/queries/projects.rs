use chrono::Utc;
use rusqlite::{params, Row};

use remark_core::context::{CreateProject, Project};

use crate::{Db, DbError};

fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        unit_id: row.get("unit_id")?,
        student_id: row.get("student_id")?,
        main_tutor_id: row.get("main_tutor_id")?,
    })
}

const PROJECT_COLUMNS: &str = "id, unit_id, student_id, main_tutor_id";

impl Db {
    pub fn create_project(&self, input: &CreateProject) -> Result<Project, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (unit_id, student_id, main_tutor_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![input.unit_id, input.student_id, input.main_tutor_id, Utc::now()],
            )?;
            let id = conn.last_insert_rowid();
            let project = conn.query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                params![id],
                row_to_project,
            )?;
            Ok(project)
        })
    }

    pub fn set_main_tutor(&self, project_id: i64, tutor_id: Option<i64>) -> Result<(), DbError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE projects SET main_tutor_id = ?1 WHERE id = ?2",
                params![tutor_id, project_id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("project {project_id}")));
            }
            Ok(())
        })
    }
}
