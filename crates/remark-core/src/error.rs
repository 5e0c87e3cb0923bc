use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemarkError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// One entry per offending field, sorted by field name.
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("inconsistent status table: {0}")]
    StatusTable(String),
}
