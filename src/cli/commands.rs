use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "td", about = concat!("[x] todo.dev v", env!("CARGO_PKG_VERSION"), " - tasks, one level deep"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use the to-do list in this directory instead of searching upward
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a to-do list in the current directory
    Init(InitArgs),
    /// List tasks, optionally filtered
    List(ListArgs),
    /// Show one task with its subtasks
    Show(IdArg),
    /// Add a task (or a subtask with --parent)
    Add(AddArgs),
    /// Set or clear the task that receives the next new task as a subtask
    Target(TargetArgs),
    /// Toggle a task's done status
    Toggle(IdArg),
    /// Enter or leave edit status
    Edit(IdArg),
    /// Change a task's title
    Title(TitleArgs),
    /// Delete a task (and its subtasks) or a subtask
    Rm(IdArg),
    /// Show or set pro mode
    Pro(ProArgs),
    /// Validate stored state
    Check(CheckArgs),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// List name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Overwrite config.toml and discard stored tasks
    #[arg(long)]
    pub force: bool,
    /// Start with no tasks instead of the examples
    #[arg(long)]
    pub empty: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only tasks whose title (or a subtask title) contains this
    pub query: Option<String>,
    /// Treat the query as a regular expression
    #[arg(long)]
    pub regex: bool,
}

#[derive(Args)]
pub struct IdArg {
    /// Task id (or a unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Add as a subtask of this task
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct TargetArgs {
    /// Task to receive the next new task
    #[arg(required_unless_present = "clear", conflicts_with = "clear")]
    pub id: Option<String>,
    /// Clear the target
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args)]
pub struct TitleArgs {
    /// Task id (or a unique prefix)
    pub id: String,
    /// New title
    pub title: String,
}

#[derive(Args)]
pub struct ProArgs {
    /// on or off (omit to show the current mode)
    #[arg(value_parser = ["on", "off"])]
    pub mode: Option<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Repair errors and save the result
    #[arg(long)]
    pub fix: bool,
}

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
    /// Print the absolute path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove all entries, not just those older than 30 days
    #[arg(long)]
    pub all: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["td", "list", "milk", "--json", "-C", "/tmp/x", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.data_dir.as_deref(), Some("/tmp/x"));
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::List(args)) => {
                assert_eq!(args.query.as_deref(), Some("milk"));
                assert!(!args.regex);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn no_subcommand_is_tui() {
        let cli = Cli::try_parse_from(["td"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn target_needs_id_or_clear() {
        assert!(Cli::try_parse_from(["td", "target"]).is_err());
        assert!(Cli::try_parse_from(["td", "target", "abc", "--clear"]).is_err());
        assert!(Cli::try_parse_from(["td", "target", "--clear"]).is_ok());
    }

    #[test]
    fn pro_mode_values() {
        assert!(Cli::try_parse_from(["td", "pro", "on"]).is_ok());
        assert!(Cli::try_parse_from(["td", "pro", "maybe"]).is_err());
    }

    #[test]
    fn recovery_log_header_commands_parse() {
        let commands: Vec<&str> = crate::io::recovery::FILE_HEADER
            .lines()
            .filter_map(|line| line.split_once(": td "))
            .map(|(_, cmd)| cmd)
            .collect();
        assert_eq!(commands, vec!["recovery", "recovery prune"]);
        for cmd in commands {
            let args = std::iter::once("td").chain(cmd.split_whitespace());
            assert!(Cli::try_parse_from(args).is_ok(), "td {} does not parse", cmd);
        }
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
