//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It does not use internal
//! threads - the caller invokes `tick()` once per elapsed second (see
//! [`super::Ticker`] for an async driver).
//!
//! ## State Transitions
//!
//! ```text
//! Idle ──start──> Running(work) ──0s──> Running(break) ──0s──> Paused(work)
//!                   │    ^                  │    ^
//!                 pause resume            pause resume
//!                   v    │                  v    │
//!                 Paused(work)            Paused(break)
//!
//! stop: any non-idle state -> Idle
//! ```
//!
//! Completing a work session writes the session to the [`Ledger`]. Breaks
//! never touch the ledger.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::sampler::OutcomeSampler;
use super::state::{TimerConfig, TimerMode, TimerPhase, TimerState};
use crate::events::Event;
use crate::ledger::{Ledger, TimeEntry};
use crate::task::Task;

/// Core timer engine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    config: TimerConfig,
    state: TimerState,
}

impl TimerEngine {
    /// Create an idle engine with a full work session on the clock.
    pub fn new(config: TimerConfig) -> Self {
        let config = config.clamped();
        Self {
            state: TimerState::new(&config),
            config,
        }
    }

    /// Rebuild an engine from a persisted state.
    ///
    /// A remaining time longer than the configured session (durations were
    /// shortened in between) is cut down to the configured length.
    pub fn restore(config: TimerConfig, mut state: TimerState) -> Self {
        let config = config.clamped();
        state.remaining_seconds = state.remaining_seconds.min(config.seconds_for(state.mode));
        if state.running && state.remaining_seconds == 0 {
            state.remaining_seconds = 1;
        }
        Self { config, state }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> TimerPhase {
        self.state.phase()
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.state.remaining_seconds
    }

    pub fn active_task_id(&self) -> Option<&str> {
        self.state.active_task_id.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn session_count(&self) -> u32 {
        self.state.session_count
    }

    /// 0.0 .. 1.0 progress within the current mode's session.
    pub fn session_progress(&self) -> f64 {
        let total = self.config.seconds_for(self.state.mode);
        if total == 0 {
            return 0.0;
        }
        1.0 - (f64::from(self.state.remaining_seconds) / f64::from(total))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply new durations. While idle the clock is re-seeded immediately;
    /// a live session keeps its remaining time and the new lengths apply from
    /// the next transition.
    pub fn set_config(&mut self, config: TimerConfig) {
        self.config = config.clamped();
        if self.phase() == TimerPhase::Idle {
            self.state.mode = TimerMode::Work;
            self.state.remaining_seconds = self.config.seconds_for(TimerMode::Work);
        } else {
            let cap = self.config.seconds_for(self.state.mode);
            self.state.remaining_seconds = self.state.remaining_seconds.min(cap).max(1);
        }
    }

    /// Begin (or restart) a work session on `task`, from any state.
    pub fn start(&mut self, task: &Task, now: DateTime<Utc>) -> Event {
        let duration_secs = self.config.seconds_for(TimerMode::Work);
        self.state.active_task_id = Some(task.id.clone());
        self.state.mode = TimerMode::Work;
        self.state.remaining_seconds = duration_secs;
        self.state.running = true;
        info!(task_id = %task.id, duration_secs, "work session started");
        Event::TimerStarted {
            task_id: task.id.clone(),
            duration_secs,
            at: now,
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        self.state.running = false;
        debug!(remaining = self.state.remaining_seconds, "timer paused");
        Some(Event::TimerPaused {
            task_id: self.state.active_task_id.clone(),
            mode: self.state.mode,
            remaining_secs: self.state.remaining_seconds,
            at: now,
        })
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !matches!(self.phase(), TimerPhase::Paused(_)) {
            return None;
        }
        self.state.running = true;
        debug!(remaining = self.state.remaining_seconds, "timer resumed");
        Some(Event::TimerResumed {
            task_id: self.state.active_task_id.clone(),
            mode: self.state.mode,
            remaining_secs: self.state.remaining_seconds,
            at: now,
        })
    }

    /// Advance the clock by one second. Returns the completion event when the
    /// session runs out.
    pub fn tick(
        &mut self,
        ledger: &mut Ledger,
        sampler: &mut dyn OutcomeSampler,
        now: DateTime<Utc>,
    ) -> Option<Event> {
        if !self.state.running {
            return None;
        }
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds == 0 {
            return Some(self.complete(ledger, sampler, now));
        }
        None
    }

    /// End the current session early, with the same effects as running out
    /// the clock.
    pub fn skip(
        &mut self,
        ledger: &mut Ledger,
        sampler: &mut dyn OutcomeSampler,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        let skipped = Event::TimerSkipped {
            task_id: self.state.active_task_id.clone(),
            from_mode: self.state.mode,
            remaining_secs: self.state.remaining_seconds,
            at: now,
        };
        let completed = self.complete(ledger, sampler, now);
        vec![skipped, completed]
    }

    /// Put the full duration of the current mode back on the clock and stop
    /// running. The active task and session history are kept.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Event {
        self.state.remaining_seconds = self.config.seconds_for(self.state.mode);
        self.state.running = false;
        Event::TimerReset {
            task_id: self.state.active_task_id.clone(),
            mode: self.state.mode,
            remaining_secs: self.state.remaining_seconds,
            at: now,
        }
    }

    /// End the engagement with the active task.
    ///
    /// Whole minutes of work elapsed so far are written to the ledger along
    /// with `progress`. The timer returns to idle in work mode.
    pub fn stop(
        &mut self,
        ledger: &mut Ledger,
        progress: Option<i64>,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Option<Event> {
        if self.phase() == TimerPhase::Idle {
            return None;
        }

        let elapsed_minutes = self.elapsed_work_minutes();
        let task_id = self.state.active_task_id.take();
        let mut recorded_progress = None;

        if let Some(ref id) = task_id {
            if elapsed_minutes > 0 {
                let mut entry = TimeEntry::new(now, elapsed_minutes);
                if let Some(text) = description.filter(|d| !d.trim().is_empty()) {
                    entry = entry.with_description(text);
                }
                ledger.record_session(id, entry);
            }
            if let Some(percent) = progress {
                ledger.record_progress(id, &new_session_id(), percent);
                recorded_progress = Some(crate::ledger::clamp_percent(percent));
            }
        }

        self.state.mode = TimerMode::Work;
        self.state.running = false;
        self.state.remaining_seconds = self.config.seconds_for(TimerMode::Work);
        info!(task_id = ?task_id, elapsed_minutes, "timer stopped");

        Some(Event::TimerStopped {
            task_id,
            elapsed_minutes,
            progress: recorded_progress,
            at: now,
        })
    }

    /// Forget everything, including the session count.
    pub fn clear(&mut self) {
        self.state = TimerState::new(&self.config);
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Minutes of the current work session already used. Partially used
    /// minutes do not count. Always 0 during a break.
    fn elapsed_work_minutes(&self) -> u32 {
        if self.state.mode != TimerMode::Work {
            return 0;
        }
        let remaining_minutes = self.state.remaining_seconds.div_ceil(60);
        self.config.work_duration.saturating_sub(remaining_minutes)
    }

    fn complete(
        &mut self,
        ledger: &mut Ledger,
        sampler: &mut dyn OutcomeSampler,
        now: DateTime<Utc>,
    ) -> Event {
        match self.state.mode {
            TimerMode::Work => {
                let duration_minutes = self.config.work_duration;
                let mut progress = None;
                let mut productivity = None;

                if let Some(ref task_id) = self.state.active_task_id {
                    ledger.record_session(task_id, TimeEntry::new(now, duration_minutes));
                    let p = sampler.progress().min(100);
                    let q = sampler.productivity().min(100);
                    ledger.record_progress(task_id, &new_session_id(), i64::from(p));
                    ledger.record_productivity(task_id, i64::from(q));
                    progress = Some(p);
                    productivity = Some(q);
                }

                self.state.session_count = self.state.session_count.saturating_add(1);
                self.state.mode = TimerMode::Break;
                self.state.remaining_seconds = self.config.seconds_for(TimerMode::Break);
                self.state.running = true;
                info!(
                    task_id = ?self.state.active_task_id,
                    session_count = self.state.session_count,
                    "work session completed"
                );

                Event::WorkSessionCompleted {
                    task_id: self.state.active_task_id.clone(),
                    duration_minutes,
                    progress,
                    productivity,
                    session_count: self.state.session_count,
                    at: now,
                }
            }
            TimerMode::Break => {
                self.state.mode = TimerMode::Work;
                self.state.remaining_seconds = self.config.seconds_for(TimerMode::Work);
                self.state.running = false;
                info!(task_id = ?self.state.active_task_id, "break completed");
                Event::BreakSessionCompleted {
                    task_id: self.state.active_task_id.clone(),
                    at: now,
                }
            }
        }
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}
