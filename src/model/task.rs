use serde::{Deserialize, Serialize};

/// Task status as stored on disk (`"done"`, `"notDone"`, `"inEdit"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Done,
    NotDone,
    InEdit,
}

impl TaskStatus {
    /// The wire name used in the stored JSON
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Done => "done",
            TaskStatus::NotDone => "notDone",
            TaskStatus::InEdit => "inEdit",
        }
    }

    /// Parse a wire name. Unknown values read as `NotDone`.
    pub fn parse_lenient(s: &str) -> TaskStatus {
        match s {
            "done" => TaskStatus::Done,
            "inEdit" => TaskStatus::InEdit,
            _ => TaskStatus::NotDone,
        }
    }

    /// The character used inside the checkbox `( )`
    pub fn checkbox_char(self) -> char {
        match self {
            TaskStatus::Done => 'x',
            TaskStatus::NotDone => ' ',
            TaskStatus::InEdit => '*',
        }
    }

    /// Done ↔ not done. A task being edited toggles to done.
    pub fn toggled_done(self) -> TaskStatus {
        match self {
            TaskStatus::Done => TaskStatus::NotDone,
            TaskStatus::NotDone | TaskStatus::InEdit => TaskStatus::Done,
        }
    }

    /// In edit → not done, anything else → in edit.
    pub fn toggled_edit(self) -> TaskStatus {
        match self {
            TaskStatus::InEdit => TaskStatus::NotDone,
            TaskStatus::Done | TaskStatus::NotDone => TaskStatus::InEdit,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        TaskStatus::parse_lenient(&s)
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A to-do item. Top-level tasks may carry one level of subtasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_tasks: Vec<Task>,
}

impl Task {
    /// Create a new, not-done task with no subtasks
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            status: TaskStatus::NotDone,
            sub_tasks: Vec::new(),
        }
    }

    pub fn with_sub_tasks(mut self, sub_tasks: Vec<Task>) -> Self {
        self.sub_tasks = sub_tasks;
        self
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    pub fn find_sub_task(&self, id: &str) -> Option<&Task> {
        self.sub_tasks.iter().find(|s| s.id == id)
    }
}
