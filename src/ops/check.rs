use std::collections::HashSet;

use serde::Serialize;

use crate::model::state::PageState;
use crate::model::task::TaskStatus;

/// Structured result from `td check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (an invariant the reducer relies on is broken).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// The same id appears more than once in the tree
    #[serde(rename = "duplicate_id")]
    DuplicateId { task_id: String, count: usize },
    /// A subtask carries its own subtasks
    #[serde(rename = "nested_subtasks")]
    NestedSubTasks {
        parent_id: String,
        task_id: String,
        count: usize,
    },
    /// The create target does not name a top-level task
    #[serde(rename = "dangling_create_target")]
    DanglingCreateTarget { parent_id: String },
}

/// A validation warning (odd, but harmless).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    #[serde(rename = "empty_title")]
    EmptyTitle { task_id: String },
    /// Task was left in edit status by an interrupted session
    #[serde(rename = "stale_edit")]
    StaleEdit { task_id: String },
}

/// Validate a page state. Read-only.
pub fn check_state(state: &PageState) -> CheckResult {
    let mut result = CheckResult::default();

    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut bump = |id: &str| match counts.iter_mut().find(|(k, _)| k == id) {
        Some((_, n)) => *n += 1,
        None => counts.push((id.to_string(), 1)),
    };

    for task in &state.tasks {
        bump(&task.id);
        check_fields(&task.id, &task.title, task.status, &mut result);
        for sub in &task.sub_tasks {
            bump(&sub.id);
            check_fields(&sub.id, &sub.title, sub.status, &mut result);
            if !sub.sub_tasks.is_empty() {
                result.errors.push(CheckError::NestedSubTasks {
                    parent_id: task.id.clone(),
                    task_id: sub.id.clone(),
                    count: sub.sub_tasks.len(),
                });
            }
        }
    }

    for (task_id, count) in counts {
        if count > 1 {
            result
                .errors
                .push(CheckError::DuplicateId { task_id, count });
        }
    }

    if let Some(parent_id) = &state.parent_task_id_for_create
        && state.find_task(parent_id).is_none()
    {
        result.errors.push(CheckError::DanglingCreateTarget {
            parent_id: parent_id.clone(),
        });
    }

    result.valid = result.errors.is_empty();
    result
}

fn check_fields(id: &str, title: &str, status: TaskStatus, result: &mut CheckResult) {
    if title.trim().is_empty() {
        result.warnings.push(CheckWarning::EmptyTitle {
            task_id: id.to_string(),
        });
    }
    if status == TaskStatus::InEdit {
        result.warnings.push(CheckWarning::StaleEdit {
            task_id: id.to_string(),
        });
    }
}

/// Fix every `CheckError` in place. Returns one line per repair.
///
/// Later duplicates are dropped (with their subtasks), nested levels below
/// the first subtask level are dropped, and a dangling create target is
/// cleared. Warnings are left alone.
pub fn repair(state: &mut PageState) -> Vec<String> {
    let mut repairs = Vec::new();

    for task in &mut state.tasks {
        for sub in &mut task.sub_tasks {
            if !sub.sub_tasks.is_empty() {
                repairs.push(format!(
                    "dropped {} nested subtask(s) under {}",
                    sub.sub_tasks.len(),
                    sub.id
                ));
                sub.sub_tasks.clear();
            }
        }
    }

    let mut seen = HashSet::new();
    state.tasks.retain(|task| {
        if seen.insert(task.id.clone()) {
            true
        } else {
            repairs.push(format!("dropped duplicate task {} ({})", task.id, task.title));
            false
        }
    });
    for task in &mut state.tasks {
        task.sub_tasks.retain(|sub| {
            if seen.insert(sub.id.clone()) {
                true
            } else {
                repairs.push(format!("dropped duplicate subtask {} ({})", sub.id, sub.title));
                false
            }
        });
    }

    if let Some(parent_id) = &state.parent_task_id_for_create
        && state.find_task(parent_id).is_none()
    {
        repairs.push(format!("cleared dangling create target {}", parent_id));
        state.parent_task_id_for_create = None;
    }

    repairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Task;
    use pretty_assertions::assert_eq;

    fn broken() -> PageState {
        let nested = Task::new("s1", "Sub").with_sub_tasks(vec![Task::new("deep", "Deep")]);
        PageState {
            tasks: vec![
                Task::new("t1", "One").with_sub_tasks(vec![nested, Task::new("t2", "clash")]),
                Task::new("t2", "Two"),
                Task::new("t1", "One again"),
            ],
            parent_task_id_for_create: Some("s1".into()),
            ..Default::default()
        }
    }

    #[test]
    fn clean_state_is_valid() {
        let state = PageState {
            tasks: vec![Task::new("a", "A").with_sub_tasks(vec![Task::new("b", "B")])],
            parent_task_id_for_create: Some("a".into()),
            ..Default::default()
        };
        let result = check_state(&state);
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn reports_every_error() {
        let result = check_state(&broken());
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                CheckError::NestedSubTasks {
                    parent_id: "t1".into(),
                    task_id: "s1".into(),
                    count: 1
                },
                CheckError::DuplicateId {
                    task_id: "t1".into(),
                    count: 2
                },
                CheckError::DuplicateId {
                    task_id: "t2".into(),
                    count: 2
                },
                CheckError::DanglingCreateTarget {
                    parent_id: "s1".into()
                },
            ]
        );
    }

    #[test]
    fn warnings_for_empty_title_and_stale_edit() {
        let mut task = Task::new("a", "  ");
        task.status = TaskStatus::InEdit;
        let state = PageState {
            tasks: vec![task],
            ..Default::default()
        };
        let result = check_state(&state);
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn repair_fixes_all_errors() {
        let mut state = broken();
        let repairs = repair(&mut state);
        assert_eq!(repairs.len(), 4);
        assert!(check_state(&state).valid);

        // first occurrence wins: the subtask "t2" was seen after top-level "t2"
        let ids: Vec<&str> = state.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
        assert_eq!(state.tasks[0].title, "One");
        assert_eq!(state.tasks[0].sub_tasks.len(), 1);
        assert!(state.tasks[0].sub_tasks[0].sub_tasks.is_empty());
        assert!(state.parent_task_id_for_create.is_none());
    }

    #[test]
    fn repair_is_noop_on_valid_state() {
        let mut state = PageState::seeded({
            let mut n = 0;
            move || {
                n += 1;
                n.to_string()
            }
        });
        let before = state.clone();
        assert!(repair(&mut state).is_empty());
        assert_eq!(state, before);
    }
}
