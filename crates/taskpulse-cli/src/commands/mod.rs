pub mod completions;
pub mod config;
pub mod insights;
pub mod ledger;
pub mod rank;
pub mod timer;

use std::path::{Path, PathBuf};

use serde::Serialize;
use taskpulse_core::bus::ListenerResult;
use taskpulse_core::storage::data_dir;
use taskpulse_core::{Config, Database, Engine, Notifier, Task};
use tracing::{debug, warn};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Writes notifications to stderr so stdout stays machine readable.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&mut self, title: &str, body: &str) -> ListenerResult {
        eprintln!("{title}: {body}");
        Ok(())
    }
}

fn tasks_path(explicit: Option<&Path>) -> CliResult<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(data_dir()?.join("tasks.json")),
    }
}

/// Read the task list. A missing default file means no tasks; a missing
/// explicit file is an error.
pub fn load_tasks(explicit: Option<&Path>) -> CliResult<Vec<Task>> {
    let path = tasks_path(explicit)?;
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
            debug!(path = %path.display(), "no task file, starting with no tasks");
            return Ok(Vec::new());
        }
        Err(e) => return Err(format!("cannot read {}: {e}", path.display()).into()),
    };
    let tasks: Vec<Task> = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid task file {}: {e}", path.display()))?;
    Ok(tasks)
}

/// Engine over the persistent store, with config and tasks loaded.
///
/// A broken config falls back to defaults and an unopenable store leaves the
/// engine in memory only. Both are logged.
pub fn open_engine(tasks: Option<&Path>) -> CliResult<Engine> {
    let mut engine = Engine::new(Config::load_or_default())
        .with_tasks(load_tasks(tasks)?)
        .with_notifier(StderrNotifier);
    match Database::open() {
        Ok(db) => engine = engine.with_store(db),
        Err(e) => warn!(error = %e, "store unavailable, state will not be saved"),
    }
    engine.init();
    Ok(engine)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
