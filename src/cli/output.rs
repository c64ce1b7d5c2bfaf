use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::state::{PageState, ProMode};
use crate::model::task::{Task, TaskStatus};
use crate::ops::check::{CheckError, CheckResult, CheckWarning};

/// Number of id characters shown in text output
pub const SHORT_ID_LEN: usize = 8;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct TaskListJson {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub pro_mode: ProMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ProModeJson {
    pub pro_mode: ProMode,
    pub changed: bool,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task, parent: Option<&str>) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        title: task.title.clone(),
        status: task.status,
        parent: parent.map(str::to_string),
        subtasks: task
            .sub_tasks
            .iter()
            .map(|s| task_to_json(s, Some(&task.id)))
            .collect(),
    }
}

pub fn list_to_json(
    name: &str,
    state: &PageState,
    tasks: &[&Task],
    query: Option<&str>,
) -> TaskListJson {
    TaskListJson {
        name: name.to_string(),
        query: query.map(str::to_string),
        pro_mode: state.pro_mode,
        target: state.parent_task_id_for_create.clone(),
        tasks: tasks.iter().map(|t| task_to_json(t, None)).collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((i, _)) => &id[..i],
        None => id,
    }
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task) -> String {
    let edit = if task.status == TaskStatus::InEdit {
        " (editing)"
    } else {
        ""
    };
    format!(
        "[{}] {}  {}{}",
        task.status.checkbox_char(),
        short_id(&task.id),
        task.title,
        edit
    )
}

/// Format a task with its subtasks, indented. `target` marks the create target.
pub fn format_task_tree(task: &Task, target: Option<&str>) -> Vec<String> {
    let mut first = format_task_line(task);
    if target == Some(task.id.as_str()) {
        first.push_str("  <- next task goes here");
    }
    let mut lines = vec![first];
    for sub in &task.sub_tasks {
        lines.push(format!("  {}", format_task_line(sub)));
    }
    lines
}

/// Format the `td list` output
pub fn format_task_listing(name: &str, state: &PageState, tasks: &[&Task]) -> Vec<String> {
    let mut lines = vec![format!("== {} ==", name), String::new()];
    if tasks.is_empty() {
        lines.push("(no tasks)".to_string());
    }
    let target = state.parent_task_id_for_create.as_deref();
    for task in tasks {
        lines.extend(format_task_tree(task, target));
    }
    lines
}

/// Format detailed task view
pub fn format_task_detail(task: &Task, parent: Option<&Task>) -> Vec<String> {
    let mut lines = vec![format!(
        "[{}] {}",
        task.status.checkbox_char(),
        task.title
    )];
    lines.push(format!("id: {}", task.id));
    lines.push(format!("status: {}", task.status.as_str()));
    if let Some(parent) = parent {
        lines.push(format!("parent: {} ({})", short_id(&parent.id), parent.title));
    }
    if !task.sub_tasks.is_empty() {
        let done = task.sub_tasks.iter().filter(|s| s.is_done()).count();
        lines.push(String::new());
        lines.push(format!("subtasks: {}/{} done", done, task.sub_tasks.len()));
        for sub in &task.sub_tasks {
            lines.push(format!("  {}", format_task_line(sub)));
        }
    }
    lines
}

pub fn format_check_result(result: &CheckResult) -> Vec<String> {
    let mut lines = Vec::new();
    if !result.errors.is_empty() {
        lines.push("Errors:".to_string());
        for err in &result.errors {
            lines.push(match err {
                CheckError::DuplicateId { task_id, count } => {
                    format!("  {} appears {} times", task_id, count)
                }
                CheckError::NestedSubTasks {
                    parent_id,
                    task_id,
                    count,
                } => format!(
                    "  subtask {} of {} has {} subtask(s) of its own",
                    task_id, parent_id, count
                ),
                CheckError::DanglingCreateTarget { parent_id } => {
                    format!("  create target {} is not a top-level task", parent_id)
                }
            });
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            lines.push(String::new());
        }
        lines.push("Warnings:".to_string());
        for warn in &result.warnings {
            lines.push(match warn {
                CheckWarning::EmptyTitle { task_id } => format!("  {} has an empty title", task_id),
                CheckWarning::StaleEdit { task_id } => format!("  {} is still in edit status", task_id),
            });
        }
    }
    if result.valid {
        lines.push("✓ state is valid".to_string());
    } else {
        lines.push("✗ state has errors".to_string());
    }
    lines
}

pub fn format_recovery_entry(entry: &RecoveryEntry) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}: {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.category,
        entry.description
    )];
    for (key, value) in &entry.fields {
        lines.push(format!("  {}: {}", key, value));
    }
    for line in entry.body.lines() {
        lines.push(format!("    {}", line));
    }
    lines
}
