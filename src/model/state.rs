use serde::{Deserialize, Serialize};

use super::task::Task;

/// Whether pointer interaction is blocked (enabled = keyboard only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProMode {
    #[default]
    Enabled,
    Disabled,
}

impl ProMode {
    pub fn is_enabled(self) -> bool {
        self == ProMode::Enabled
    }

    pub fn label(self) -> &'static str {
        match self {
            ProMode::Enabled => "enabled",
            ProMode::Disabled => "disabled",
        }
    }
}

/// Everything the app persists under the `state` key
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    pub tasks: Vec<Task>,
    /// Top-level task currently receiving a new subtask
    #[serde(default)]
    pub parent_task_id_for_create: Option<String>,
    #[serde(default)]
    pub pro_mode: ProMode,
}

/// Where a task lives in the two-level tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskLocation {
    Task { task_id: String },
    SubTask { task_id: String, parent_id: String },
}

impl TaskLocation {
    pub fn task_id(&self) -> &str {
        match self {
            TaskLocation::Task { task_id } | TaskLocation::SubTask { task_id, .. } => task_id,
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        match self {
            TaskLocation::Task { .. } => None,
            TaskLocation::SubTask { parent_id, .. } => Some(parent_id),
        }
    }
}

impl PageState {
    /// The state shown on first run
    pub fn seeded(mut next_id: impl FnMut() -> String) -> Self {
        let first = Task::new(next_id(), "Todo.dev").with_sub_tasks(vec![
            Task::new(next_id(), "child task"),
            Task::new(next_id(), "keyboard accessibility"),
            Task::new(next_id(), "command pallete"),
        ]);
        let second = Task::new(next_id(), "think 5k project");
        PageState {
            tasks: vec![first, second],
            parent_task_id_for_create: None,
            pro_mode: ProMode::Enabled,
        }
    }

    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Look up a task or subtask by exact id
    pub fn locate(&self, id: &str) -> Option<TaskLocation> {
        for task in &self.tasks {
            if task.id == id {
                return Some(TaskLocation::Task {
                    task_id: task.id.clone(),
                });
            }
            if task.find_sub_task(id).is_some() {
                return Some(TaskLocation::SubTask {
                    task_id: id.to_string(),
                    parent_id: task.id.clone(),
                });
            }
        }
        None
    }

    /// Resolve a task or subtask by id prefix. Exact matches win.
    /// Returns all candidates when the prefix is ambiguous.
    pub fn locate_prefix(&self, prefix: &str) -> Result<TaskLocation, Vec<String>> {
        if let Some(loc) = self.locate(prefix) {
            return Ok(loc);
        }
        let mut hits = Vec::new();
        for task in &self.tasks {
            if task.id.starts_with(prefix) {
                hits.push(TaskLocation::Task {
                    task_id: task.id.clone(),
                });
            }
            for sub in &task.sub_tasks {
                if sub.id.starts_with(prefix) {
                    hits.push(TaskLocation::SubTask {
                        task_id: sub.id.clone(),
                        parent_id: task.id.clone(),
                    });
                }
            }
        }
        if hits.len() == 1 {
            Ok(hits.remove(0))
        } else {
            Err(hits.iter().map(|l| l.task_id().to_string()).collect())
        }
    }

    /// Fetch the task at a location
    pub fn get(&self, loc: &TaskLocation) -> Option<&Task> {
        match loc {
            TaskLocation::Task { task_id } => self.find_task(task_id),
            TaskLocation::SubTask { task_id, parent_id } => {
                self.find_task(parent_id)?.find_sub_task(task_id)
            }
        }
    }

    /// Count of (tasks, subtasks, done of both)
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut subs = 0;
        let mut done = 0;
        for task in &self.tasks {
            if task.is_done() {
                done += 1;
            }
            subs += task.sub_tasks.len();
            done += task.sub_tasks.iter().filter(|s| s.is_done()).count();
        }
        (self.tasks.len(), subs, done)
    }
}
