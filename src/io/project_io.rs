use std::path::{Path, PathBuf};

use crate::io::config_io::read_config;
use crate::model::project::{DATA_DIR_NAME, Project};

/// Error type for locating and opening a data directory
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("no to-do list found: run `td init` first")]
    NotAProject,
    #[error("a to-do list already exists in {0}")]
    AlreadyInitialized(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Walk up from `start` looking for a `.todo/` directory with a config.toml.
/// Returns the directory that contains it.
pub fn discover_project(start: &Path) -> Result<PathBuf, ProjectError> {
    let mut current = start.to_path_buf();
    loop {
        let data_dir = current.join(DATA_DIR_NAME);
        if data_dir.is_dir() && data_dir.join("config.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ProjectError::NotAProject);
        }
    }
}

/// Open the data directory under `root`.
pub fn load_project(root: &Path) -> Result<Project, ProjectError> {
    let data_dir = root.join(DATA_DIR_NAME);
    if !data_dir.is_dir() {
        return Err(ProjectError::NotAProject);
    }
    let config = read_config(&data_dir)?;
    tracing::debug!(dir = %data_dir.display(), "opened data directory");
    Ok(Project {
        root: root.to_path_buf(),
        data_dir,
        config,
    })
}

/// Resolve an explicit `-C` directory (used as-is) or discover from `cwd`.
pub fn open_project(explicit: Option<&Path>, cwd: &Path) -> Result<Project, ProjectError> {
    let root = match explicit {
        Some(dir) => {
            let dir = if dir.is_absolute() {
                dir.to_path_buf()
            } else {
                cwd.join(dir)
            };
            // accept either the root or the .todo directory itself
            if dir.file_name().and_then(|n| n.to_str()) == Some(DATA_DIR_NAME) {
                dir.parent().map(Path::to_path_buf).unwrap_or(dir)
            } else {
                dir
            }
        }
        None => discover_project(cwd)?,
    };
    load_project(&root)
}
