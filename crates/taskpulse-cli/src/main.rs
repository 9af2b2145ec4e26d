use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "taskpulse", version, about = "TaskPulse CLI")]
pub struct Cli {
    /// Task list as a JSON array [default: <data_dir>/tasks.json]
    #[arg(long, global = true, value_name = "PATH")]
    tasks: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Rank tasks by priority score
    Rank(commands::rank::RankArgs),
    /// Productive hours and ideal session length
    Insights,
    /// Session history
    Ledger {
        #[command(subcommand)]
        action: commands::ledger::LedgerAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing() {
    // Warnings by default, RUST_LOG overrides; stdout stays reserved for
    // command output.
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let tasks = cli.tasks.as_deref();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, tasks),
        Commands::Rank(args) => commands::rank::run(args, tasks),
        Commands::Insights => commands::insights::run(tasks),
        Commands::Ledger { action } => commands::ledger::run(action, tasks),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            commands::completions::run(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
