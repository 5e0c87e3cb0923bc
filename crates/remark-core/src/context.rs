use serde::{Deserialize, Serialize};

use crate::task_status::TaskStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
}

/// A teaching unit. Its staff roster lives in `unit_staff`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUnit {
    pub code: String,
    pub name: String,
}

/// A student's enrolment in a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub unit_id: i64,
    pub student_id: i64,
    /// Supervising role: the tutor whose reads fan out to the whole staff.
    pub main_tutor_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub unit_id: i64,
    pub student_id: i64,
    #[serde(default)]
    pub main_tutor_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: i64,
    pub name: String,
    #[serde(default = "default_status")]
    pub status: TaskStatus,
}

fn default_status() -> TaskStatus {
    TaskStatus::NotSubmitted
}

/// Everything read-receipt fan-out needs to know about where a comment lives.
#[derive(Debug, Clone)]
pub struct CommentContext {
    pub task_id: i64,
    pub project_id: i64,
    pub unit_id: i64,
    pub main_tutor_id: Option<i64>,
}

impl CommentContext {
    pub fn is_supervisor(&self, user_id: i64) -> bool {
        self.main_tutor_id == Some(user_id)
    }
}
