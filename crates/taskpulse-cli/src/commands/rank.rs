use std::path::Path;

use clap::{Args, ValueEnum};
use taskpulse_core::{Bucket, ScoringWeights};

use super::{open_engine, print_json, CliResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum Preset {
    /// Completed tasks lose 15 points
    TaskList,
    /// Completed tasks lose 30 points
    Dashboard,
}

impl Preset {
    fn weights(self) -> ScoringWeights {
        match self {
            Preset::TaskList => ScoringWeights::task_list(),
            Preset::Dashboard => ScoringWeights::dashboard(),
        }
    }
}

#[derive(Args)]
pub struct RankArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
    /// Weight preset [default: configured scoring weights]
    #[arg(long, value_enum)]
    preset: Option<Preset>,
}

pub fn run(args: RankArgs, tasks: Option<&Path>) -> CliResult {
    let engine = open_engine(tasks)?;
    let classification = match args.preset {
        Some(preset) => engine.classify_with(preset.weights()),
        None => engine.classify(),
    };

    if args.json {
        return print_json(&classification);
    }

    if classification.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for bucket in Bucket::ALL {
        let results = classification.bucket(bucket);
        if results.is_empty() {
            continue;
        }
        println!("{bucket} ({})", results.len());
        for result in results {
            let name = engine
                .task(&result.task_id)
                .map(|t| t.name.as_str())
                .unwrap_or("");
            println!("  {:>4}  {:<12} {}", result.score, result.task_id, name);
        }
    }
    Ok(())
}
