use std::path::Path;

use clap::Subcommand;
use serde_json::json;

use super::{open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum LedgerAction {
    /// Show recorded history, for one task or all of them
    Show {
        /// Task ID
        task_id: Option<String>,
    },
    /// Clear all history and put the timer back to idle
    Reset,
}

pub fn run(action: LedgerAction, tasks: Option<&Path>) -> CliResult {
    let mut engine = open_engine(tasks)?;

    match action {
        LedgerAction::Show { task_id: Some(id) } => {
            let ledger = engine.ledger();
            print_json(&json!({
                "task_id": id,
                "time_spent": ledger.time_spent(&id),
                "progress": ledger.progress_map().get(&id).cloned().unwrap_or_default(),
                "productivity": ledger.productivity(&id),
            }))?;
        }
        LedgerAction::Show { task_id: None } => {
            let ledger = engine.ledger();
            print_json(&json!({
                "time_spent": ledger.time_spent_map(),
                "task_progress": ledger.progress_map(),
                "productivity_data": ledger.productivity_map(),
            }))?;
        }
        LedgerAction::Reset => {
            engine.reset();
            println!("ledger cleared");
        }
    }

    engine.dispose();
    Ok(())
}
