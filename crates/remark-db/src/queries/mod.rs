pub mod comments;
pub mod projects;
pub mod read_receipts;
pub mod tasks;
pub mod units;
pub mod users;
