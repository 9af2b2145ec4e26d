use std::path::Path;
use std::time::Duration;

use clap::Subcommand;
use serde::Serialize;
use taskpulse_core::{Engine, Event, Ticker, TimerPhase, TimerState};
use tokio::time::{self, Instant};

use super::{open_engine, print_json, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a work session on a task
    Start {
        /// Task ID from the task list
        task_id: String,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Complete the current session now
    Skip,
    /// Put the full duration back on the clock, paused
    Reset,
    /// Stop working on the active task and record elapsed minutes
    Stop {
        /// Progress made on the task (0-100) [default: subtask completion]
        #[arg(long)]
        progress: Option<i64>,
        /// Note stored with the time entry
        #[arg(long)]
        description: Option<String>,
    },
    /// Advance the clock without waiting
    Tick {
        #[arg(long, default_value = "1")]
        seconds: u32,
    },
    /// Drive the timer in real time, printing events as they happen
    Run {
        /// Stop after this many seconds [default: until the timer stops]
        #[arg(long = "for", value_name = "SECONDS")]
        duration: Option<u64>,
    },
    /// Print current timer state as JSON
    Status,
}

#[derive(Serialize)]
struct TimerReport<'a> {
    phase: TimerPhase,
    remaining: String,
    /// Fraction of the current session already elapsed
    progress: f64,
    state: &'a TimerState,
    events: Vec<Event>,
}

fn report(engine: &Engine, events: Vec<Event>) -> CliResult {
    let state = engine.timer_state();
    let remaining = format!(
        "{:02}:{:02}",
        state.remaining_seconds / 60,
        state.remaining_seconds % 60
    );
    print_json(&TimerReport {
        phase: engine.phase(),
        remaining,
        progress: engine.timer().session_progress(),
        state,
        events,
    })
}

pub fn run(action: TimerAction, tasks: Option<&Path>) -> CliResult {
    let mut engine = open_engine(tasks)?;

    let events = match action {
        TimerAction::Start { task_id } => engine.start(&task_id)?,
        TimerAction::Pause => engine.pause(),
        TimerAction::Resume => engine.resume(),
        TimerAction::Skip => engine.skip(),
        TimerAction::Reset => engine.reset_timer(),
        TimerAction::Stop {
            progress,
            description,
        } => engine.stop(progress, description),
        TimerAction::Tick { seconds } => engine.advance(seconds),
        TimerAction::Run { duration } => return run_live(engine, duration),
        TimerAction::Status => Vec::new(),
    };

    report(&engine, events)?;
    engine.dispose();
    Ok(())
}

fn run_live(engine: Engine, duration: Option<u64>) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async move {
        let mut engine = engine;
        let (_, mut rx) = engine.subscribe_channel();
        let ticker = Ticker::new(engine);
        // Resumes a paused session and starts driving a running one.
        ticker.resume().await;

        let deadline = duration.map(|secs| Instant::now() + Duration::from_secs(secs));
        let until = async {
            match deadline {
                Some(deadline) => time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(until);
        let mut poll = time::interval(Duration::from_millis(250));

        loop {
            tokio::select! {
                Some(event) = rx.recv() => print_json(&event)?,
                _ = &mut until => break,
                _ = poll.tick() => {
                    if !ticker.is_ticking().await {
                        break;
                    }
                }
            }
        }

        ticker.shutdown().await;
        while let Ok(event) = rx.try_recv() {
            print_json(&event)?;
        }

        let shared = ticker.engine();
        let mut engine = shared.lock().await;
        report(&engine, Vec::new())?;
        engine.dispose();
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
