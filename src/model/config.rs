use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppInfo,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        AppInfo {
            name: default_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Toggling a task's done status also sets all of its subtasks
    #[serde(default = "default_true")]
    pub cascade_toggle: bool,
    /// Populate the example tasks when nothing has been stored yet
    #[serde(default = "default_true")]
    pub seed_on_first_run: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            cascade_toggle: true,
            seed_on_first_run: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_name() -> String {
    "Todo.dev".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub show_key_hints: bool,
    /// Color overrides, e.g. `highlight = "#FB4196"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
}
