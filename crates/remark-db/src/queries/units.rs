use chrono::Utc;
use rusqlite::{params, Row};

use remark_core::context::{CreateUnit, Unit};

use crate::{Db, DbError};

fn row_to_unit(row: &Row) -> rusqlite::Result<Unit> {
    Ok(Unit {
        id: row.get("id")?,
        code: row.get("code")?,
        name: row.get("name")?,
    })
}

impl Db {
    pub fn create_unit(&self, input: &CreateUnit) -> Result<Unit, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO units (code, name, created_at) VALUES (?1, ?2, ?3)",
                params![input.code, input.name, Utc::now()],
            )?;
            let id = conn.last_insert_rowid();
            let unit = conn.query_row(
                "SELECT id, code, name FROM units WHERE id = ?1",
                params![id],
                row_to_unit,
            )?;
            Ok(unit)
        })
    }

    /// Add a user to the unit's staff roster. Adding twice is a no-op.
    pub fn add_unit_staff(&self, unit_id: i64, user_id: i64) -> Result<(), DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO unit_staff (unit_id, user_id) VALUES (?1, ?2)",
                params![unit_id, user_id],
            )?;
            Ok(())
        })
    }

    /// User ids of the unit's staff, ascending.
    pub fn list_unit_staff(&self, unit_id: i64) -> Result<Vec<i64>, DbError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT user_id FROM unit_staff WHERE unit_id = ?1 ORDER BY user_id")?;
            let staff = stmt
                .query_map(params![unit_id], |r| r.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            Ok(staff)
        })
    }
}
