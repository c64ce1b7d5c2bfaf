use std::fs;
use std::path::Path;

use crate::io::project_io::ProjectError;
use crate::model::config::AppConfig;

/// Commented config written by `td init`. Every key is optional.
pub const CONFIG_TEMPLATE: &str = r##"[app]
name = "{name}"

[behavior]
# Toggling a task's done status also sets all of its subtasks
cascade_toggle = true
# Start with the example tasks when nothing has been saved yet
seed_on_first_run = {seed}

[ui]
# Show key hints in the status row
show_key_hints = true

# Color overrides
# [ui.colors]
# highlight = "#FB4196"
# done = "#5A5A5A"
"##;

/// Read and parse `config.toml` from the data directory. A missing file
/// yields the defaults.
pub fn read_config(data_dir: &Path) -> Result<AppConfig, ProjectError> {
    let path = data_dir.join("config.toml");
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(e) => return Err(ProjectError::ReadError { path, source: e }),
    };
    Ok(toml::from_str(&text)?)
}

/// Fill in the init template
pub fn render_config(name: &str, seed: bool) -> String {
    CONFIG_TEMPLATE
        .replace("{name}", &name.replace('\\', "\\\\").replace('"', "\\\""))
        .replace("{seed}", if seed { "true" } else { "false" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn template_parses() {
        let config: AppConfig = toml::from_str(&render_config("Home \"list\"", false)).unwrap();
        assert_eq!(config.app.name, "Home \"list\"");
        assert!(!config.behavior.seed_on_first_run);
        assert!(config.behavior.cascade_toggle);
        assert!(config.ui.show_key_hints);
    }

    #[test]
    fn missing_config_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = read_config(tmp.path()).unwrap();
        assert_eq!(config.app.name, "Todo.dev");
    }

    #[test]
    fn malformed_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "[app\nname = 1").unwrap();
        let err = read_config(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::ConfigParseError(_)));
    }
}
