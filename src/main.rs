use clap::Parser;
use todo_dev::cli::commands::{Cli, Commands};
use todo_dev::cli::handlers;

fn main() {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone();

    match cli.command {
        None => {
            // No subcommand → launch TUI (no stderr logging while it owns the terminal)
            if let Err(e) = todo_dev::tui::run(data_dir.as_deref()) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Init(args)) => {
            handlers::init_logging(cli.verbose);
            // Init is handled before project discovery
            if let Err(e) = handlers::cmd_init(args, data_dir.as_deref()) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        Some(_) => {
            handlers::init_logging(cli.verbose);
            if let Err(e) = handlers::dispatch(cli) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
