//! Integration tests for the engine against a real SQLite store.

use chrono::{Duration, TimeZone, Utc};
use taskpulse_core::ledger::{PRODUCTIVITY_KEY, TIME_SPENT_KEY};
use taskpulse_core::timer::FixedSampler;
use taskpulse_core::{
    BlobStore, Bucket, Config, Database, Engine, EventKind, ManualClock, Task, TaskPriority,
    TaskStatus, TimerConfig, TimerMode, TimerPhase,
};

fn tasks() -> Vec<Task> {
    let morning = Utc.with_ymd_and_hms(2024, 6, 3, 9, 15, 0).unwrap();
    let afternoon = Utc.with_ymd_and_hms(2024, 6, 3, 14, 40, 0).unwrap();
    vec![
        Task::new("report", "Quarterly report", TaskPriority::High, morning)
            .with_status(TaskStatus::InProgress)
            .with_deadline(Utc.with_ymd_and_hms(2024, 6, 10, 17, 0, 0).unwrap()),
        Task::new("inbox", "Inbox zero", TaskPriority::Low, afternoon),
    ]
}

fn engine(clock: &ManualClock, sampler: FixedSampler) -> Engine {
    let config = Config {
        timer: TimerConfig::new(2, 1),
        ..Config::default()
    };
    Engine::new(config)
        .with_tasks(tasks())
        .with_sampler(sampler)
        .with_clock(clock.clone())
}

#[test]
fn test_sessions_persist_across_engines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskpulse.db");
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap());

    {
        let mut engine = engine(&clock, FixedSampler::new(80, 90))
            .with_store(Database::open_at(&path).unwrap());
        engine.init();
        engine.start("report").unwrap();
        engine.advance(120);
        engine.advance(60);
        assert_eq!(engine.phase(), TimerPhase::Paused(TimerMode::Work));
        engine.dispose();
    }

    let db = Database::open_at(&path).unwrap();
    assert!(db.get(TIME_SPENT_KEY).unwrap().is_some());
    assert!(db.get(PRODUCTIVITY_KEY).unwrap().is_some());

    let mut engine = engine(&clock, FixedSampler::new(80, 90)).with_store(db);
    engine.init();
    assert_eq!(engine.ledger().time_spent("report").total, 2);
    assert_eq!(engine.ledger().productivity("report").sessions, vec![90]);
    assert_eq!(engine.timer_state().session_count, 1);
    assert_eq!(engine.timer_state().active_task_id.as_deref(), Some("report"));
    assert_eq!(engine.phase(), TimerPhase::Paused(TimerMode::Work));
}

#[test]
fn test_stop_records_elapsed_minutes() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap());
    let mut engine = engine(&clock, FixedSampler::new(80, 90));
    engine.start("report").unwrap();
    // 61 seconds used: one whole minute elapsed, the second has only started.
    engine.advance(61);
    let events = engine.stop(Some(40), Some("half way".into()));

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::TimerStopped);
    let record = engine.ledger().time_spent("report");
    assert_eq!(record.total, 1);
    assert_eq!(record.sessions[0].description.as_deref(), Some("half way"));
    assert_eq!(engine.ledger().latest_progress("report"), Some(40));
    assert!(engine.ledger().productivity("report").sessions.is_empty());
    assert_eq!(engine.phase(), TimerPhase::Idle);
    assert_eq!(engine.timer().remaining_seconds(), 120);
}

#[test]
fn test_channel_subscriber_sees_lifecycle() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap());
    let mut engine = engine(&clock, FixedSampler::new(80, 90));
    let (id, mut rx) = engine.subscribe_channel();

    engine.start("report").unwrap();
    engine.pause();
    engine.pause();
    engine.resume();
    engine.reset_timer();
    engine.unsubscribe(id);
    engine.resume();

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.task_id(), Some("report"));
        kinds.push(event.kind());
    }
    assert_eq!(
        kinds,
        vec![
            EventKind::TimerStarted,
            EventKind::TimerPaused,
            EventKind::TimerResumed,
            EventKind::TimerReset,
        ]
    );
}

#[test]
fn test_scoring_and_insights_follow_history() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap());
    let mut engine = engine(&clock, FixedSampler::new(80, 95));

    // report: high (50) + deadline today (35) + in progress (15)
    let ranked = engine.scores();
    assert_eq!(ranked[0].task_id, "report");
    assert_eq!(ranked[0].score, 100);
    assert_eq!(ranked[0].bucket, Bucket::Urgent);
    assert_eq!(ranked[1].score, 10);

    let report = engine.patterns();
    assert!(report.cold_start);
    assert_eq!(report.peak_hours, vec![9, 14]);

    for _ in 0..31 {
        engine.start("inbox").unwrap();
        engine.skip();
    }
    clock.advance(Duration::hours(1));

    // inbox: low (10) + productivity > 70 (15) + more than an hour invested (10)
    let inbox = engine
        .scores()
        .into_iter()
        .find(|r| r.task_id == "inbox")
        .unwrap();
    assert_eq!(inbox.score, 35);
    assert_eq!(inbox.bucket, Bucket::Routine);

    let report = engine.patterns();
    assert!(!report.cold_start);
    assert_eq!(report.peak_hours, vec![14]);
    assert_eq!(report.optimal_duration_minutes, 2);
    assert_eq!(engine.suggestions()[0].average_productivity, 95);
}
