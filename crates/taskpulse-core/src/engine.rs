//! The engine context.
//!
//! [`Engine`] owns everything a session needs: settings, the task set, the
//! timer, the ledger, the event bus and the injected collaborators (outcome
//! sampler, clock, blob store, notifier). Several engines can live side by
//! side; nothing here is global.
//!
//! Every timer operation returns the events it produced, after they have
//! been published on the bus. Whenever an operation produced events the
//! timer state and ledger are written to the store, best effort.

use tracing::{debug, info, warn};

use crate::bus::{notification_for, EventBus, ListenerResult, Notifier, SubscriptionId};
use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, Result};
use crate::events::{Event, EventKind};
use crate::ledger::Ledger;
use crate::scoring::{
    Classification, PriorityScorer, ScoreResult, ScoringConfig, ScoringWeights,
};
use crate::stats::{PatternAnalyzer, PatternReport, ScheduleSuggestion};
use crate::storage::{BlobStore, Config};
use crate::task::Task;
use crate::timer::{OutcomeSampler, RandomSampler, TimerEngine, TimerPhase, TimerState};

/// Store key of the serialized [`TimerState`].
pub const TIMER_STATE_KEY: &str = "timer_state";

pub struct Engine {
    config: Config,
    tasks: Vec<Task>,
    timer: TimerEngine,
    ledger: Ledger,
    bus: EventBus,
    sampler: Box<dyn OutcomeSampler + Send>,
    clock: Box<dyn Clock + Send + Sync>,
    store: Option<Box<dyn BlobStore + Send>>,
    notifier: Option<Box<dyn Notifier + Send>>,
}

impl Engine {
    /// A fresh engine: idle timer, empty ledger, random sampler drawing from
    /// the configured ranges, system clock, no store.
    pub fn new(config: Config) -> Self {
        let sampler = RandomSampler::new(&config.sampler);
        Self {
            timer: TimerEngine::new(config.timer),
            config,
            tasks: Vec::new(),
            ledger: Ledger::new(),
            bus: EventBus::new(),
            sampler: Box::new(sampler),
            clock: Box::new(SystemClock),
            store: None,
            notifier: None,
        }
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_sampler(mut self, sampler: impl OutcomeSampler + Send + 'static) -> Self {
        self.sampler = Box::new(sampler);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_store(mut self, store: impl BlobStore + Send + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + Send + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Load the timer state and ledger from the store.
    ///
    /// Missing or unreadable entries fall back to defaults; this never fails.
    pub fn init(&mut self) {
        let Some(store) = self.store.as_deref() else {
            debug!("no store attached, starting empty");
            return;
        };

        self.ledger = Ledger::from_blobs(|key| fetch(store, key));

        let state = fetch(store, TIMER_STATE_KEY).and_then(|raw| {
            serde_json::from_str::<TimerState>(&raw)
                .map_err(|e| warn!(key = TIMER_STATE_KEY, error = %e, "ignoring malformed blob"))
                .ok()
        });
        self.timer = match state {
            Some(state) => TimerEngine::restore(self.config.timer, state),
            None => TimerEngine::new(self.config.timer),
        };
        info!(phase = ?self.timer.phase(), "engine initialised");
    }

    /// Clear the timer (including the session count) and the whole ledger,
    /// then persist the empty state. Subscriptions survive.
    pub fn reset(&mut self) {
        self.timer.clear();
        self.ledger.clear();
        self.persist();
        info!("engine reset");
    }

    /// Flush to the store and detach every collaborator and subscriber.
    pub fn dispose(&mut self) {
        self.persist();
        self.bus.clear();
        self.store = None;
        self.notifier = None;
        debug!("engine disposed");
    }

    // ── Inputs ───────────────────────────────────────────────────────

    /// Replace the task set. Ledger history for tasks no longer present is
    /// kept.
    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    /// Apply new settings. Timer durations take effect as described on
    /// [`TimerEngine::set_config`]; the injected sampler is kept.
    pub fn update_config(&mut self, config: Config) {
        self.timer.set_config(config.timer);
        self.config = config;
    }

    pub fn set_notifications_enabled(&mut self, enabled: bool) {
        self.config.notifications.enabled = enabled;
    }

    // ── Timer operations ─────────────────────────────────────────────

    /// Start a work session on `task_id` from any state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownTask`] without touching the timer when the
    /// id does not resolve to a known task.
    pub fn start(&mut self, task_id: &str) -> Result<Vec<Event>> {
        let task = self
            .task(task_id)
            .cloned()
            .ok_or_else(|| CoreError::UnknownTask(task_id.to_string()))?;
        let now = self.clock.now();
        let event = self.timer.start(&task, now);
        Ok(self.dispatch(vec![event]))
    }

    /// Start over on `task`, which must be part of the task set.
    pub fn restart(&mut self, task: &Task) -> Result<Vec<Event>> {
        self.start(&task.id)
    }

    pub fn pause(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let events = self.timer.pause(now).into_iter().collect();
        self.dispatch(events)
    }

    pub fn resume(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let events = self.timer.resume(now).into_iter().collect();
        self.dispatch(events)
    }

    /// One elapsed second.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let events = self
            .timer
            .tick(&mut self.ledger, &mut *self.sampler, now)
            .into_iter()
            .collect();
        self.dispatch(events)
    }

    /// `seconds` ticks in a row. Stops early once the timer is no longer
    /// running (a break ending pauses it).
    pub fn advance(&mut self, seconds: u32) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..seconds {
            if !self.timer.is_running() {
                break;
            }
            events.extend(self.tick());
        }
        events
    }

    /// Complete the current session now. Does nothing while idle.
    pub fn skip(&mut self) -> Vec<Event> {
        if self.timer.phase() == TimerPhase::Idle {
            return Vec::new();
        }
        let now = self.clock.now();
        let events = self.timer.skip(&mut self.ledger, &mut *self.sampler, now);
        self.dispatch(events)
    }

    /// Put the current mode's full duration back on the clock, paused.
    pub fn reset_timer(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let event = self.timer.reset(now);
        self.dispatch(vec![event])
    }

    /// End the engagement with the active task.
    ///
    /// Without an explicit `progress`, the active task's subtask completion
    /// is recorded when it has subtasks.
    pub fn stop(&mut self, progress: Option<i64>, description: Option<String>) -> Vec<Event> {
        let progress = progress.or_else(|| {
            self.timer
                .active_task_id()
                .and_then(|id| self.task(id))
                .filter(|task| !task.subtasks.is_empty())
                .map(|task| i64::from(task.subtask_progress()))
        });
        let now = self.clock.now();
        let events = self
            .timer
            .stop(&mut self.ledger, progress, description, now)
            .into_iter()
            .collect();
        self.dispatch(events)
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    pub fn timer_state(&self) -> &TimerState {
        self.timer.state()
    }

    pub fn phase(&self) -> TimerPhase {
        self.timer.phase()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Every task scored with the configured weights, highest first.
    pub fn scores(&self) -> Vec<ScoreResult> {
        self.scorer(self.config.scoring)
            .rank(&self.tasks, &self.ledger, self.clock.now())
    }

    pub fn classify(&self) -> Classification {
        self.scorer(self.config.scoring)
            .classify(&self.tasks, &self.ledger, self.clock.now())
    }

    /// Classification under a different weight preset, e.g.
    /// [`ScoringWeights::dashboard`].
    pub fn classify_with(&self, weights: ScoringWeights) -> Classification {
        let mut scoring = self.config.scoring;
        scoring.weights = weights;
        self.scorer(scoring)
            .classify(&self.tasks, &self.ledger, self.clock.now())
    }

    // Deadline days share the analyzer's local day.
    fn scorer(&self, scoring: ScoringConfig) -> PriorityScorer {
        PriorityScorer::new(scoring).with_utc_offset(self.config.analysis.utc_offset_minutes)
    }

    pub fn patterns(&self) -> PatternReport {
        PatternAnalyzer::new(self.config.analysis).analyze(&self.tasks, &self.ledger)
    }

    pub fn suggestions(&self) -> Vec<ScheduleSuggestion> {
        self.patterns().suggestions
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Event) -> ListenerResult + Send + 'static,
    {
        self.bus.subscribe(listener)
    }

    pub fn subscribe_to<F>(&mut self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: FnMut(&Event) -> ListenerResult + Send + 'static,
    {
        self.bus.subscribe_to(kind, listener)
    }

    pub fn subscribe_channel(
        &mut self,
    ) -> (SubscriptionId, tokio::sync::mpsc::UnboundedReceiver<Event>) {
        self.bus.subscribe_channel()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn dispatch(&mut self, events: Vec<Event>) -> Vec<Event> {
        if events.is_empty() {
            return events;
        }
        for event in &events {
            self.bus.publish(event);
            self.notify(event);
        }
        self.persist();
        events
    }

    fn notify(&mut self, event: &Event) {
        if !self.config.notifications.enabled {
            return;
        }
        let (Some(notifier), Some((title, body))) =
            (self.notifier.as_deref_mut(), notification_for(event))
        else {
            return;
        };
        if let Err(e) = notifier.notify(title, &body) {
            warn!(event = %event.kind(), error = %e, "notification failed");
        }
    }

    fn persist(&self) {
        let Some(store) = self.store.as_deref() else {
            return;
        };

        match serde_json::to_string(self.timer.state()) {
            Ok(raw) => put(store, TIMER_STATE_KEY, &raw),
            Err(e) => warn!(key = TIMER_STATE_KEY, error = %e, "failed to encode timer state"),
        }
        match self.ledger.to_blobs() {
            Ok(blobs) => {
                for (key, raw) in blobs {
                    put(store, key, &raw);
                }
            }
            Err(e) => warn!(error = %e, "failed to encode ledger"),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("tasks", &self.tasks.len())
            .field("timer", &self.timer)
            .field("bus", &self.bus)
            .field("store", &self.store.is_some())
            .finish()
    }
}

fn fetch(store: &(dyn BlobStore + Send), key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "store read failed, using defaults");
            None
        }
    }
}

fn put(store: &(dyn BlobStore + Send), key: &str, value: &str) {
    if let Err(e) = store.put(key, value) {
        warn!(key, error = %e, "store write failed");
    }
}
