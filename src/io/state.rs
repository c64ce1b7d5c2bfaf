use serde::{Deserialize, Serialize};

use crate::io::persisted::PersistedState;
use crate::io::store::SharedStore;

/// Storage key for the TUI state
pub const UI_KEY: &str = "ui";

/// Persisted TUI state (written to ui.json next to the page state)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    /// Last committed search query
    #[serde(default)]
    pub last_search: Option<String>,
    /// Whether the last search was a regex
    #[serde(default)]
    pub regex: bool,
    /// Id of the selected row
    #[serde(default)]
    pub cursor_id: Option<String>,
}

/// Load the TUI state, or defaults when none is stored
pub fn load_ui_state(store: SharedStore) -> PersistedState<UiState> {
    PersistedState::load(store, UI_KEY, UiState::default())
}
