use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RemarkError;

/// Workflow state of a task. Each variant owns a fixed persisted id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotSubmitted,
    Complete,
    NeedHelp,
    WorkingOnIt,
    FixAndResubmit,
    FixAndInclude,
    Redo,
    Discuss,
    ReadyToMark,
}

impl TaskStatus {
    pub const ALL: &[TaskStatus] = &[
        TaskStatus::NotSubmitted,
        TaskStatus::Complete,
        TaskStatus::NeedHelp,
        TaskStatus::WorkingOnIt,
        TaskStatus::FixAndResubmit,
        TaskStatus::FixAndInclude,
        TaskStatus::Redo,
        TaskStatus::Discuss,
        TaskStatus::ReadyToMark,
    ];

    pub fn id(&self) -> i64 {
        match self {
            TaskStatus::NotSubmitted => 1,
            TaskStatus::Complete => 2,
            TaskStatus::NeedHelp => 3,
            TaskStatus::WorkingOnIt => 4,
            TaskStatus::FixAndResubmit => 5,
            TaskStatus::FixAndInclude => 6,
            TaskStatus::Redo => 7,
            TaskStatus::Discuss => 8,
            TaskStatus::ReadyToMark => 9,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.id() == id)
    }

    pub fn key(&self) -> &'static str {
        match self {
            TaskStatus::NotSubmitted => "not_submitted",
            TaskStatus::Complete => "complete",
            TaskStatus::NeedHelp => "need_help",
            TaskStatus::WorkingOnIt => "working_on_it",
            TaskStatus::FixAndResubmit => "fix_and_resubmit",
            TaskStatus::FixAndInclude => "fix_and_include",
            TaskStatus::Redo => "redo",
            TaskStatus::Discuss => "discuss",
            TaskStatus::ReadyToMark => "ready_to_mark",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TaskStatus::NotSubmitted => "Not Submitted",
            TaskStatus::Complete => "Complete",
            TaskStatus::NeedHelp => "Need Help",
            TaskStatus::WorkingOnIt => "Working On It",
            TaskStatus::FixAndResubmit => "Fix and Resubmit",
            TaskStatus::FixAndInclude => "Fix and Include",
            TaskStatus::Redo => "Redo",
            TaskStatus::Discuss => "Discuss",
            TaskStatus::ReadyToMark => "Ready to Mark",
        }
    }

    /// Lenient lookup from user input. Accepts keys in either `snake_case`
    /// or space separated form, any case. Anything else is `NotSubmitted`.
    pub fn status_for_name(name: &str) -> Self {
        let normalized = name.trim().to_lowercase().replace(' ', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.key() == normalized)
            .unwrap_or(TaskStatus::NotSubmitted)
    }

    /// Exact lookup by display name, falling back to `NotSubmitted`.
    pub fn from_display_name(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.display_name() == name)
            .unwrap_or(TaskStatus::NotSubmitted)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Check persisted `(id, name)` rows against the enum mapping. Every variant
/// must appear exactly once under its own id and display name, and no other
/// rows may exist.
pub fn verify_status_table(rows: &[(i64, String)]) -> Result<(), RemarkError> {
    let mut by_id: BTreeMap<i64, &str> = BTreeMap::new();
    for (id, name) in rows {
        if by_id.insert(*id, name.as_str()).is_some() {
            return Err(RemarkError::StatusTable(format!("duplicate id {id}")));
        }
    }

    let mut problems = Vec::new();
    for status in TaskStatus::ALL {
        match by_id.remove(&status.id()) {
            None => problems.push(format!("missing id {} ({})", status.id(), status.key())),
            Some(name) if name != status.display_name() => problems.push(format!(
                "id {} is named {name:?}, expected {:?}",
                status.id(),
                status.display_name()
            )),
            Some(_) => {}
        }
    }
    for (id, name) in by_id {
        problems.push(format!("unexpected id {id} ({name:?})"));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(RemarkError::StatusTable(problems.join("; ")))
    }
}
