use crate::io::persisted::PersistedReducer;
use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::store::{SharedStore, StoreError};
use crate::model::config::AppConfig;
use crate::model::state::{PageState, ProMode, TaskLocation};
use crate::model::task::Task;
use crate::ops::reducer::{IdSource, PageAction, PageReducer, UuidIds};

/// Storage key for the page state
pub const STATE_KEY: &str = "state";

/// The page state, persisted through the page reducer
pub type PageStore = PersistedReducer<PageReducer>;

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task id {prefix} is ambiguous: {}", .candidates.join(", "))]
    Ambiguous {
        prefix: String,
        candidates: Vec<String>,
    },
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("{0} is a subtask: subtasks cannot have subtasks")]
    NotATopLevelTask(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Open the page state with random ids.
pub fn open_page(store: SharedStore, config: &AppConfig) -> PageStore {
    open_page_with(store, config, UuidIds)
}

/// Open the page state with the given id source. The seed state (when
/// enabled) draws its ids from the same source.
pub fn open_page_with(
    store: SharedStore,
    config: &AppConfig,
    ids: impl IdSource + Send + 'static,
) -> PageStore {
    let mut reducer = PageReducer::new(ids, config.behavior.cascade_toggle);
    let initial = if config.behavior.seed_on_first_run {
        PageState::seeded(|| reducer.next_id())
    } else {
        PageState::default()
    };
    PersistedReducer::load(store, STATE_KEY, reducer, initial)
}

/// Resolve a full id or unique id prefix to a task location.
pub fn resolve(page: &PageStore, id: &str) -> Result<TaskLocation, TaskError> {
    page.state()
        .locate_prefix(id)
        .map_err(|candidates| match candidates.len() {
            0 => TaskError::NotFound(id.to_string()),
            _ => TaskError::Ambiguous {
                prefix: id.to_string(),
                candidates,
            },
        })
}

fn clean_title(title: &str) -> Result<String, TaskError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::EmptyTitle);
    }
    Ok(title.to_string())
}

/// Create a task. When a create target is set, the task becomes a subtask
/// of the target and the target is cleared. Returns the new id.
pub fn create_task(page: &mut PageStore, title: &str) -> Result<String, TaskError> {
    let title = clean_title(title)?;

    match page.state().parent_task_id_for_create.clone() {
        Some(parent_id) => {
            if page.state().find_task(&parent_id).is_none() {
                page.dispatch(PageAction::SetParentIdForCreate { parent_id: None })?;
                return Err(TaskError::NotFound(parent_id));
            }
            page.dispatch(PageAction::AppendSubTask {
                new_title: title,
                parent_id: parent_id.clone(),
            })?;
            page.dispatch(PageAction::SetParentIdForCreate { parent_id: None })?;
            let id = page
                .state()
                .find_task(&parent_id)
                .and_then(|t| t.sub_tasks.last())
                .map(|s| s.id.clone())
                .ok_or(TaskError::NotFound(parent_id))?;
            tracing::debug!(%id, "created subtask");
            Ok(id)
        }
        None => {
            page.dispatch(PageAction::AppendTask { new_title: title })?;
            let id = page
                .state()
                .tasks
                .last()
                .map(|t| t.id.clone())
                .ok_or_else(|| TaskError::NotFound("new task".to_string()))?;
            tracing::debug!(%id, "created task");
            Ok(id)
        }
    }
}

/// Create a subtask of `parent_id` directly, leaving the create target alone.
/// Returns the new id.
pub fn create_subtask(
    page: &mut PageStore,
    parent_id: &str,
    title: &str,
) -> Result<String, TaskError> {
    let title = clean_title(title)?;
    let parent_id = match resolve(page, parent_id)? {
        TaskLocation::Task { task_id } => task_id,
        TaskLocation::SubTask { task_id, .. } => return Err(TaskError::NotATopLevelTask(task_id)),
    };
    page.dispatch(PageAction::AppendSubTask {
        new_title: title,
        parent_id: parent_id.clone(),
    })?;
    let id = page
        .state()
        .find_task(&parent_id)
        .and_then(|t| t.sub_tasks.last())
        .map(|s| s.id.clone())
        .ok_or(TaskError::NotFound(parent_id))?;
    tracing::debug!(%id, "created subtask");
    Ok(id)
}

/// Make `parent_id` the create target. Returns the resolved id.
pub fn begin_create_subtask(page: &mut PageStore, parent_id: &str) -> Result<String, TaskError> {
    match resolve(page, parent_id)? {
        TaskLocation::Task { task_id } => {
            page.dispatch(PageAction::SetParentIdForCreate {
                parent_id: Some(task_id.clone()),
            })?;
            Ok(task_id)
        }
        TaskLocation::SubTask { task_id, .. } => Err(TaskError::NotATopLevelTask(task_id)),
    }
}

pub fn cancel_create_subtask(page: &mut PageStore) -> Result<(), TaskError> {
    page.dispatch(PageAction::SetParentIdForCreate { parent_id: None })?;
    Ok(())
}

/// Toggle done status of a task or subtask
pub fn toggle_task(page: &mut PageStore, id: &str) -> Result<TaskLocation, TaskError> {
    let loc = resolve(page, id)?;
    let action = match &loc {
        TaskLocation::Task { task_id } => PageAction::ToggleDoneStatusTask {
            task_id: task_id.clone(),
        },
        TaskLocation::SubTask { task_id, parent_id } => PageAction::ToggleDoneStatusSubTask {
            task_id: task_id.clone(),
            parent_id: parent_id.clone(),
        },
    };
    page.dispatch(action)?;
    Ok(loc)
}

/// Enter or leave edit status
pub fn toggle_edit(page: &mut PageStore, id: &str) -> Result<TaskLocation, TaskError> {
    let loc = resolve(page, id)?;
    let action = match &loc {
        TaskLocation::Task { task_id } => PageAction::ToggleUpdateStatusTask {
            task_id: task_id.clone(),
        },
        TaskLocation::SubTask { task_id, parent_id } => PageAction::ToggleUpdateStatusSubTask {
            task_id: task_id.clone(),
            parent_id: parent_id.clone(),
        },
    };
    page.dispatch(action)?;
    Ok(loc)
}

/// Set a new title; the task leaves edit status
pub fn update_task(page: &mut PageStore, id: &str, title: &str) -> Result<TaskLocation, TaskError> {
    let new_title = clean_title(title)?;
    let loc = resolve(page, id)?;
    let action = match &loc {
        TaskLocation::Task { task_id } => PageAction::UpdateTask {
            task_id: task_id.clone(),
            new_title,
        },
        TaskLocation::SubTask { task_id, parent_id } => PageAction::UpdateSubTask {
            task_id: task_id.clone(),
            parent_id: parent_id.clone(),
            new_title,
        },
    };
    page.dispatch(action)?;
    Ok(loc)
}

/// Delete a task (with its subtasks) or a subtask. Returns what was removed;
/// a copy also goes to the recovery log.
pub fn delete_task(page: &mut PageStore, id: &str) -> Result<Task, TaskError> {
    let loc = resolve(page, id)?;
    let removed = page
        .state()
        .get(&loc)
        .cloned()
        .ok_or_else(|| TaskError::NotFound(id.to_string()))?;

    let action = match &loc {
        TaskLocation::Task { task_id } => PageAction::DeleteTask {
            task_id: task_id.clone(),
        },
        TaskLocation::SubTask { task_id, parent_id } => PageAction::DeleteSubTask {
            task_id: task_id.clone(),
            parent_id: parent_id.clone(),
        },
    };
    page.dispatch(action)?;

    if let Some(dir) = page.store().data_dir() {
        let mut entry = RecoveryEntry::new(
            RecoveryCategory::Delete,
            format!("task {} deleted", removed.id),
        )
        .field("Title", removed.title.clone());
        if let Some(parent_id) = loc.parent_id() {
            entry = entry.field("Parent", parent_id);
        }
        if let Ok(json) = serde_json::to_string_pretty(&removed) {
            entry = entry.body(json);
        }
        log_recovery(dir, entry);
    }
    Ok(removed)
}

/// Set pro mode. Returns whether it changed.
pub fn set_pro_mode(page: &mut PageStore, enabled: bool) -> Result<bool, TaskError> {
    let action = if enabled {
        PageAction::EnableProMode
    } else {
        PageAction::DisableProMode
    };
    Ok(page.dispatch(action)?)
}

pub fn toggle_pro_mode(page: &mut PageStore) -> Result<ProMode, TaskError> {
    let enable = !page.state().pro_mode.is_enabled();
    set_pro_mode(page, enable)?;
    Ok(page.state().pro_mode)
}
