use crate::model::state::{PageState, ProMode};
use crate::model::task::{Task, TaskStatus};
use crate::ops::check;

/// A state transition function with persisted state
pub trait Reducer {
    type State;
    type Action;

    /// Produce the next state. Must not modify `state`.
    fn reduce(&mut self, state: &Self::State, action: Self::Action) -> Self::State;

    /// Fix up a freshly loaded state. Returns a description of each repair.
    fn normalize(&self, _state: &mut Self::State) -> Vec<String> {
        Vec::new()
    }
}

/// Source of fresh task ids
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Random v4 UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic `prefix-N` ids
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: &str) -> Self {
        SequentialIds {
            prefix: prefix.to_string(),
            next: 1,
        }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Every state transition the page supports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    AppendTask {
        new_title: String,
    },
    AppendSubTask {
        new_title: String,
        parent_id: String,
    },
    ToggleDoneStatusTask {
        task_id: String,
    },
    ToggleDoneStatusSubTask {
        task_id: String,
        parent_id: String,
    },
    ToggleUpdateStatusTask {
        task_id: String,
    },
    ToggleUpdateStatusSubTask {
        task_id: String,
        parent_id: String,
    },
    UpdateTask {
        task_id: String,
        new_title: String,
    },
    UpdateSubTask {
        task_id: String,
        parent_id: String,
        new_title: String,
    },
    DeleteTask {
        task_id: String,
    },
    DeleteSubTask {
        task_id: String,
        parent_id: String,
    },
    SetParentIdForCreate {
        parent_id: Option<String>,
    },
    EnableProMode,
    DisableProMode,
}

/// The page reducer. Owns the id source so appends stay deterministic in tests.
pub struct PageReducer {
    ids: Box<dyn IdSource + Send>,
    cascade_toggle: bool,
}

impl PageReducer {
    pub fn new(ids: impl IdSource + Send + 'static, cascade_toggle: bool) -> Self {
        PageReducer {
            ids: Box::new(ids),
            cascade_toggle,
        }
    }

    pub fn cascade_toggle(&self) -> bool {
        self.cascade_toggle
    }

    /// Generate a fresh id from this reducer's source
    pub fn next_id(&mut self) -> String {
        self.ids.next_id()
    }

    fn apply(&mut self, state: &mut PageState, action: PageAction) {
        match action {
            PageAction::AppendTask { new_title } => {
                let id = self.ids.next_id();
                state.tasks.push(Task::new(id, new_title));
            }
            PageAction::AppendSubTask {
                new_title,
                parent_id,
            } => {
                // only top-level tasks can take subtasks
                if let Some(parent) = find_mut(&mut state.tasks, &parent_id) {
                    let id = self.ids.next_id();
                    parent.sub_tasks.push(Task::new(id, new_title));
                }
            }
            PageAction::ToggleDoneStatusTask { task_id } => {
                if let Some(task) = find_mut(&mut state.tasks, &task_id) {
                    let new_status = task.status.toggled_done();
                    task.status = new_status;
                    if self.cascade_toggle {
                        for sub in &mut task.sub_tasks {
                            sub.status = new_status;
                        }
                    }
                }
            }
            PageAction::ToggleDoneStatusSubTask { task_id, parent_id } => {
                if let Some(sub) = find_sub_mut(&mut state.tasks, &parent_id, &task_id) {
                    sub.status = sub.status.toggled_done();
                }
            }
            PageAction::ToggleUpdateStatusTask { task_id } => {
                if let Some(task) = find_mut(&mut state.tasks, &task_id) {
                    task.status = task.status.toggled_edit();
                }
            }
            PageAction::ToggleUpdateStatusSubTask { task_id, parent_id } => {
                if let Some(sub) = find_sub_mut(&mut state.tasks, &parent_id, &task_id) {
                    sub.status = sub.status.toggled_edit();
                }
            }
            PageAction::UpdateTask { task_id, new_title } => {
                if let Some(task) = find_mut(&mut state.tasks, &task_id) {
                    task.title = new_title;
                    task.status = TaskStatus::NotDone;
                }
            }
            PageAction::UpdateSubTask {
                task_id,
                parent_id,
                new_title,
            } => {
                if let Some(sub) = find_sub_mut(&mut state.tasks, &parent_id, &task_id) {
                    sub.title = new_title;
                    sub.status = TaskStatus::NotDone;
                }
            }
            PageAction::DeleteTask { task_id } => {
                state.tasks.retain(|t| t.id != task_id);
                if state.parent_task_id_for_create.as_deref() == Some(task_id.as_str()) {
                    state.parent_task_id_for_create = None;
                }
            }
            PageAction::DeleteSubTask { task_id, parent_id } => {
                if let Some(parent) = find_mut(&mut state.tasks, &parent_id) {
                    parent.sub_tasks.retain(|s| s.id != task_id);
                }
            }
            PageAction::SetParentIdForCreate { parent_id } => {
                state.parent_task_id_for_create = parent_id;
            }
            PageAction::EnableProMode => state.pro_mode = ProMode::Enabled,
            PageAction::DisableProMode => state.pro_mode = ProMode::Disabled,
        }
    }
}

impl Reducer for PageReducer {
    type State = PageState;
    type Action = PageAction;

    fn reduce(&mut self, state: &PageState, action: PageAction) -> PageState {
        let mut next = state.clone();
        self.apply(&mut next, action);
        next
    }

    fn normalize(&self, state: &mut PageState) -> Vec<String> {
        check::repair(state)
    }
}

fn find_mut<'a>(tasks: &'a mut [Task], id: &str) -> Option<&'a mut Task> {
    tasks.iter_mut().find(|t| t.id == id)
}

fn find_sub_mut<'a>(tasks: &'a mut [Task], parent_id: &str, id: &str) -> Option<&'a mut Task> {
    find_mut(tasks, parent_id)?
        .sub_tasks
        .iter_mut()
        .find(|s| s.id == id)
}
