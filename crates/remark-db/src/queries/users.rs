use chrono::Utc;
use rusqlite::{params, Row};

use remark_core::context::{CreateUser, User};

use crate::{not_found, Db, DbError};

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
    })
}

impl Db {
    pub fn create_user(&self, input: &CreateUser) -> Result<User, DbError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, created_at) VALUES (?1, ?2, ?3)",
                params![input.name, input.email, Utc::now()],
            )?;
            let id = conn.last_insert_rowid();
            let user = conn.query_row(
                "SELECT id, name, email FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            )?;
            Ok(user)
        })
    }

    pub fn get_user(&self, id: i64) -> Result<User, DbError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, email FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            )
            .map_err(not_found(format!("user {id}")))
        })
    }

    pub fn user_exists(&self, id: i64) -> Result<bool, DbError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT count(*) FROM users WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )?;
            Ok(count > 0)
        })
    }
}
