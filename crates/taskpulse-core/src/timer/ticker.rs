//! Async once-per-second driver for an [`Engine`].
//!
//! One spawned task owns the interval. Each tick takes the engine lock, so
//! ticks never overlap with each other or with commands. Commands that stop
//! the clock cancel the driving task before they touch the engine.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

use crate::engine::Engine;
use crate::error::Result;
use crate::events::Event;

#[derive(Clone)]
pub struct Ticker {
    engine: Arc<Mutex<Engine>>,
    handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    period: Duration,
}

impl Ticker {
    pub fn new(engine: Engine) -> Self {
        Self::from_shared(Arc::new(Mutex::new(engine)))
    }

    pub fn from_shared(engine: Arc<Mutex<Engine>>) -> Self {
        Self {
            engine,
            handle: Arc::new(Mutex::new(None)),
            period: Duration::from_secs(1),
        }
    }

    /// Real time per engine second. Defaults to one second.
    pub fn with_interval(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn engine(&self) -> Arc<Mutex<Engine>> {
        Arc::clone(&self.engine)
    }

    /// True while a driving task is alive.
    pub async fn is_ticking(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    pub async fn start(&self, task_id: &str) -> Result<Vec<Event>> {
        let events = self.engine.lock().await.start(task_id)?;
        self.spawn_ticker().await;
        Ok(events)
    }

    pub async fn pause(&self) -> Vec<Event> {
        self.cancel_ticker().await;
        self.engine.lock().await.pause()
    }

    pub async fn resume(&self) -> Vec<Event> {
        let events = self.engine.lock().await.resume();
        self.sync_ticker().await;
        events
    }

    pub async fn skip(&self) -> Vec<Event> {
        let events = self.engine.lock().await.skip();
        self.sync_ticker().await;
        events
    }

    pub async fn reset(&self) -> Vec<Event> {
        self.cancel_ticker().await;
        self.engine.lock().await.reset_timer()
    }

    pub async fn stop(&self, progress: Option<i64>, description: Option<String>) -> Vec<Event> {
        self.cancel_ticker().await;
        self.engine.lock().await.stop(progress, description)
    }

    /// Cancel the driving task and wait for nothing else.
    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
    }

    async fn sync_ticker(&self) {
        let running = self.engine.lock().await.timer().is_running();
        if running {
            if !self.is_ticking().await {
                self.spawn_ticker().await;
            }
        } else {
            self.cancel_ticker().await;
        }
    }

    async fn spawn_ticker(&self) {
        let mut guard = self.handle.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let engine = Arc::clone(&self.engine);
        let period = self.period;
        *guard = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let mut engine = engine.lock().await;
                if !engine.timer().is_running() {
                    break;
                }
                engine.tick();
                if !engine.timer().is_running() {
                    break;
                }
            }
            debug!("ticker finished");
        }));
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticker").field("period", &self.period).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Config;
    use crate::task::{Task, TaskPriority};
    use crate::timer::{FixedSampler, TimerConfig, TimerMode, TimerPhase};
    use chrono::Utc;

    fn engine(config: Config) -> Engine {
        Engine::new(config)
            .with_tasks(vec![Task::new(
                "t1",
                "Focus",
                TaskPriority::High,
                Utc::now(),
            )])
            .with_sampler(FixedSampler::new(90, 90))
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second() {
        let ticker = Ticker::new(engine(Config::default()));
        ticker.start("t1").await.unwrap();
        time::sleep(Duration::from_millis(3500)).await;

        let shared = ticker.engine();
        assert_eq!(shared.lock().await.timer().remaining_seconds(), 1497);
        ticker.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn custom_interval_drives_faster() {
        let ticker =
            Ticker::new(engine(Config::default())).with_interval(Duration::from_millis(250));
        ticker.start("t1").await.unwrap();
        time::sleep(Duration::from_millis(1100)).await;

        let shared = ticker.engine();
        assert_eq!(shared.lock().await.timer().remaining_seconds(), 1496);
        ticker.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn pause_suppresses_pending_ticks() {
        let ticker = Ticker::new(engine(Config::default()));
        ticker.start("t1").await.unwrap();
        time::sleep(Duration::from_millis(2500)).await;
        ticker.pause().await;
        assert!(!ticker.is_ticking().await);

        time::sleep(Duration::from_secs(10)).await;
        let shared = ticker.engine();
        assert_eq!(shared.lock().await.timer().remaining_seconds(), 1498);

        ticker.resume().await;
        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(shared.lock().await.timer().remaining_seconds(), 1497);
        ticker.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stops_driving_after_break_ends() {
        let config = Config {
            timer: TimerConfig::new(1, 1),
            ..Config::default()
        };
        let ticker = Ticker::new(engine(config));
        ticker.start("t1").await.unwrap();
        time::sleep(Duration::from_secs(125)).await;

        let shared = ticker.engine();
        let engine = shared.lock().await;
        assert_eq!(engine.phase(), TimerPhase::Paused(TimerMode::Work));
        assert_eq!(engine.ledger().time_spent("t1").total, 1);
        drop(engine);
        assert!(!ticker.is_ticking().await);
    }
}
