//! # TaskPulse Core Library
//!
//! Session timer and productivity scoring engine. The CLI in `taskpulse-cli`
//! is a thin consumer; every operation lives here.
//!
//! ## Architecture
//!
//! - **Timer**: tick-driven work/break state machine. The caller invokes
//!   `tick()` once per second, or lets a [`Ticker`] do it
//! - **Ledger**: append-only per-task time, progress and productivity records
//! - **Scoring**: additive priority model mapping tasks onto four buckets
//! - **Patterns**: peak productive hours and ideal session length
//! - **Bus**: synchronous typed fan-out of lifecycle events
//! - **Storage**: blob store trait (SQLite `kv` table or in-memory) and TOML
//!   configuration
//!
//! ## Key Components
//!
//! - [`Engine`]: context object owning all of the above
//! - [`TimerEngine`]: timer state machine
//! - [`Ledger`]: session history
//! - [`PriorityScorer`]: task ranking
//! - [`PatternAnalyzer`]: schedule suggestions

pub mod bus;
pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod scoring;
pub mod stats;
pub mod storage;
pub mod task;
pub mod timer;

pub use bus::{EventBus, Notifier, SubscriptionId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::Engine;
pub use error::{ConfigError, CoreError, StorageError};
pub use events::{Event, EventKind};
pub use ledger::Ledger;
pub use scoring::{Bucket, Classification, PriorityScorer, ScoreResult, ScoringWeights};
pub use stats::{PatternAnalyzer, PatternReport, ScheduleSuggestion};
pub use storage::{BlobStore, Config, Database, MemoryStore};
pub use task::{Task, TaskPriority, TaskStatus};
pub use timer::{OutcomeSampler, Ticker, TimerConfig, TimerEngine, TimerMode, TimerPhase, TimerState};
