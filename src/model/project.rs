use std::path::PathBuf;
use std::sync::Arc;

use super::config::AppConfig;
use crate::io::store::{FileStore, SharedStore};

/// Name of the data directory created by `td init`
pub const DATA_DIR_NAME: &str = ".todo";

/// An opened to-do data directory
#[derive(Debug, Clone)]
pub struct Project {
    /// Directory containing `.todo/`
    pub root: PathBuf,
    /// Path to the `.todo/` directory
    pub data_dir: PathBuf,
    /// Parsed config.toml
    pub config: AppConfig,
}

impl Project {
    /// A file store over the data directory
    pub fn store(&self) -> SharedStore {
        Arc::new(FileStore::new(&self.data_dir))
    }
}
