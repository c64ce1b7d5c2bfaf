mod init;
pub use init::cmd_init;

use std::path::PathBuf;
use std::sync::Mutex;

/// Global override for the data directory (set by -C flag)
static DATA_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::persisted::{LoadSource, PersistedState};
use crate::io::project_io::{self, ProjectError};
use crate::io::recovery::{prune_recovery, read_recovery_entries, recovery_log_path};
use crate::io::store::KeyValueStore;
use crate::model::project::Project;
use crate::model::state::{PageState, TaskLocation};
use crate::ops::check;
use crate::ops::page_ops::{self, PageStore, STATE_KEY};
use crate::ops::search::{SearchPattern, filter_tasks};

/// Default number of recovery entries shown
const RECOVERY_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install the stderr subscriber used by CLI commands. `TODO_LOG` takes a
/// full filter directive; `-v` / `-vv` override it.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    };
    let filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::new(level),
        None => tracing_subscriber::EnvFilter::try_from_env("TODO_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;

    // Store -C override for load_project_cwd()
    if let Some(ref dir) = cli.data_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        DATA_DIR_OVERRIDE
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(abs);
    }

    match cli.command {
        None => Err("no command given (run `td` without arguments for the interactive view)".into()),
        Some(cmd) => match cmd {
            // Init is handled in main.rs before project discovery
            Commands::Init(args) => cmd_init(args, cli.data_dir.as_deref()),

            // Read commands
            Commands::List(args) => cmd_list(args, json),
            Commands::Show(args) => cmd_show(args, json),
            Commands::Check(args) => cmd_check(args, json),
            Commands::Recovery(args) => cmd_recovery(args, json),

            // Write commands
            Commands::Add(args) => cmd_add(args, json),
            Commands::Target(args) => cmd_target(args),
            Commands::Toggle(args) => cmd_toggle(args, json),
            Commands::Edit(args) => cmd_edit(args, json),
            Commands::Title(args) => cmd_title(args, json),
            Commands::Rm(args) => cmd_rm(args, json),
            Commands::Pro(args) => cmd_pro(args, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_project_cwd() -> Result<Project, ProjectError> {
    let cwd = std::env::current_dir().map_err(ProjectError::IoError)?;
    let explicit = DATA_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clone();
    project_io::open_project(explicit.as_deref(), &cwd)
}

/// Open the page state. A first-run seed, or the default that replaced a
/// corrupt blob, is written straight away so the ids printed by one command
/// still resolve in the next.
fn open_page_cwd() -> Result<(Project, PageStore), Box<dyn std::error::Error>> {
    let project = load_project_cwd()?;
    let page = page_ops::open_page(project.store(), &project.config);
    let write_default = match page.source() {
        LoadSource::Missing => !page.state().tasks.is_empty(),
        // the blob is already in the recovery log
        LoadSource::Corrupt => true,
        LoadSource::Stored | LoadSource::Unreadable => false,
    };
    if write_default {
        page.persist()?;
    }
    Ok((project, page))
}

/// Print one task after a write, as JSON or as its one-line summary.
fn print_task_at(
    page: &PageStore,
    loc: &TaskLocation,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let task = page
        .state()
        .get(loc)
        .ok_or_else(|| format!("task not found: {}", loc.task_id()))?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&task_to_json(task, loc.parent_id()))?
        );
    } else {
        println!("{}", format_task_line(task));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (project, page) = open_page_cwd()?;
    let pattern = args
        .query
        .as_deref()
        .map(|q| SearchPattern::new(q, args.regex))
        .transpose()
        .map_err(|e| format!("invalid search pattern: {}", e))?;

    let state = page.state();
    let tasks = filter_tasks(&state.tasks, pattern.as_ref());

    if json {
        let out = list_to_json(&project.config.app.name, state, &tasks, args.query.as_deref());
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in format_task_listing(&project.config.app.name, state, &tasks) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_show(args: IdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, page) = open_page_cwd()?;
    let loc = page_ops::resolve(&page, &args.id)?;
    let state = page.state();
    let task = state
        .get(&loc)
        .ok_or_else(|| format!("task not found: {}", args.id))?;
    let parent = loc.parent_id().and_then(|p| state.find_task(p));

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&task_to_json(task, loc.parent_id()))?
        );
    } else {
        for line in format_task_detail(task, parent) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_check(args: CheckArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project_cwd()?;
    let store = project.store();

    // Validate what is on disk, before the loader repairs anything.
    // JSON null reads as missing, like the loader.
    let state: PageState = match store.get_item(STATE_KEY)? {
        Some(raw) => serde_json::from_str::<Option<PageState>>(&raw)
            .map_err(|e| format!("stored state is not readable: {}", e))?
            .unwrap_or_default(),
        None => PageState::default(),
    };
    let result = check::check_state(&state);

    let repairs = if args.fix && !result.valid {
        let mut stored = PersistedState::load(store, STATE_KEY, PageState::default());
        let mut fixed = stored.get().clone();
        let repairs = check::repair(&mut fixed);
        stored.set(fixed)?;
        repairs
    } else {
        Vec::new()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in format_check_result(&result) {
            println!("{}", line);
        }
        if !repairs.is_empty() {
            println!();
            println!("Repaired:");
            for r in &repairs {
                println!("  {}", r);
            }
        }
    }
    Ok(())
}

fn cmd_recovery(args: RecoveryCmd, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let project = load_project_cwd()?;
    let data_dir = &project.data_dir;

    match args.action {
        Some(RecoveryAction::Path) => {
            println!("{}", recovery_log_path(data_dir).display());
        }
        Some(RecoveryAction::Prune(prune)) => {
            let removed = prune_recovery(data_dir, None, prune.all)?;
            if json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                println!("pruned {} recovery entr{}", removed, if removed == 1 { "y" } else { "ies" });
            }
        }
        None => {
            let entries =
                read_recovery_entries(data_dir, Some(args.limit.unwrap_or(RECOVERY_LIMIT)));
            if json {
                let values: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else if entries.is_empty() {
                println!("(recovery log is empty)");
            } else {
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        println!();
                    }
                    for line in format_recovery_entry(entry) {
                        println!("{}", line);
                    }
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut page) = open_page_cwd()?;
    let id = match &args.parent {
        Some(parent) => page_ops::create_subtask(&mut page, parent, &args.title)?,
        None => page_ops::create_task(&mut page, &args.title)?,
    };
    if json {
        let loc = page_ops::resolve(&page, &id)?;
        print_task_at(&page, &loc, true)?;
    } else {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_target(args: TargetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut page) = open_page_cwd()?;
    match args.id {
        Some(id) if !args.clear => {
            let id = page_ops::begin_create_subtask(&mut page, &id)?;
            println!("next task goes under {}", short_id(&id));
        }
        _ => {
            page_ops::cancel_create_subtask(&mut page)?;
            println!("target cleared");
        }
    }
    Ok(())
}

fn cmd_toggle(args: IdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut page) = open_page_cwd()?;
    let loc = page_ops::toggle_task(&mut page, &args.id)?;
    print_task_at(&page, &loc, json)
}

fn cmd_edit(args: IdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut page) = open_page_cwd()?;
    let loc = page_ops::toggle_edit(&mut page, &args.id)?;
    print_task_at(&page, &loc, json)
}

fn cmd_title(args: TitleArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut page) = open_page_cwd()?;
    let loc = page_ops::update_task(&mut page, &args.id, &args.title)?;
    if json {
        print_task_at(&page, &loc, true)
    } else {
        println!("{} title updated", short_id(loc.task_id()));
        Ok(())
    }
}

fn cmd_rm(args: IdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut page) = open_page_cwd()?;
    let removed = page_ops::delete_task(&mut page, &args.id)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&task_to_json(&removed, None))?
        );
    } else {
        let subs = removed.sub_tasks.len();
        if subs > 0 {
            println!(
                "deleted {} ({}) and {} subtask{}",
                short_id(&removed.id),
                removed.title,
                subs,
                if subs == 1 { "" } else { "s" }
            );
        } else {
            println!("deleted {} ({})", short_id(&removed.id), removed.title);
        }
    }
    Ok(())
}

fn cmd_pro(args: ProArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut page) = open_page_cwd()?;
    let changed = match args.mode.as_deref() {
        Some("on") => page_ops::set_pro_mode(&mut page, true)?,
        Some("off") => page_ops::set_pro_mode(&mut page, false)?,
        Some(other) => return Err(format!("unknown mode '{}' (expected: on, off)", other).into()),
        None => false,
    };
    let mode = page.state().pro_mode;
    if json {
        let out = ProModeJson {
            pro_mode: mode,
            changed,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("pro mode {}", mode.label());
    }
    Ok(())
}
