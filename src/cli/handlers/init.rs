use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::config_io::render_config;
use crate::io::project_io::{self, ProjectError};
use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::state::UI_KEY;
use crate::io::store::{FileStore, KeyValueStore};
use crate::model::project::DATA_DIR_NAME;
use crate::ops::page_ops::STATE_KEY;

/// Infer a list name from a directory name: replace hyphens and underscores
/// with spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Throw away stored values, keeping a copy of the task state in the
/// recovery log.
fn discard_stored(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::new(data_dir);
    if let Some(previous) = store.get_item(STATE_KEY)? {
        log_recovery(
            data_dir,
            RecoveryEntry::new(RecoveryCategory::Delete, "state discarded by init --force")
                .field("Key", STATE_KEY)
                .body(previous),
        );
    }
    store.remove_item(STATE_KEY)?;
    store.remove_item(UI_KEY)?;
    Ok(())
}

pub fn cmd_init(args: InitArgs, dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let root = match dir {
        Some(d) => cwd.join(d),
        None => cwd,
    };
    let data_dir = root.join(DATA_DIR_NAME);

    if data_dir.is_dir() {
        if !args.force {
            return Err(ProjectError::AlreadyInitialized(data_dir).into());
        }
        discard_stored(&data_dir)?;
    } else if let Some(parent) = root.parent()
        && let Ok(parent_root) = project_io::discover_project(parent)
    {
        eprintln!(
            "Note: parent list found at {}/",
            parent_root.join(DATA_DIR_NAME).display()
        );
        eprintln!("Creating new list in ./{}/", DATA_DIR_NAME);
    }

    let name = args.name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Todo.dev".to_string())
    });

    fs::create_dir_all(&data_dir)?;
    fs::write(data_dir.join("config.toml"), render_config(&name, !args.empty))?;
    tracing::info!(dir = %data_dir.display(), "initialized data directory");

    println!("Initialized to-do list: {}", name);
    Ok(())
}
