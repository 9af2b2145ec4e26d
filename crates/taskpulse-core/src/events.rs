use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::timer::TimerMode;

/// Every timer transition produces an Event.
/// Listeners receive them through the [`crate::bus::EventBus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        task_id: String,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        task_id: Option<String>,
        mode: TimerMode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        task_id: Option<String>,
        mode: TimerMode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        task_id: Option<String>,
        mode: TimerMode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// Emitted before the completion event the skip triggers.
    TimerSkipped {
        task_id: Option<String>,
        from_mode: TimerMode,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    WorkSessionCompleted {
        task_id: Option<String>,
        duration_minutes: u32,
        /// Present when a task was active and samples were recorded.
        progress: Option<u8>,
        productivity: Option<u8>,
        session_count: u32,
        at: DateTime<Utc>,
    },
    BreakSessionCompleted {
        task_id: Option<String>,
        at: DateTime<Utc>,
    },
    TimerStopped {
        task_id: Option<String>,
        elapsed_minutes: u32,
        progress: Option<u8>,
        at: DateTime<Utc>,
    },
}

/// Discriminant of [`Event`], used for filtered subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TimerStarted,
    TimerPaused,
    TimerResumed,
    TimerReset,
    TimerSkipped,
    WorkSessionCompleted,
    BreakSessionCompleted,
    TimerStopped,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TimerStarted => "timer_started",
            EventKind::TimerPaused => "timer_paused",
            EventKind::TimerResumed => "timer_resumed",
            EventKind::TimerReset => "timer_reset",
            EventKind::TimerSkipped => "timer_skipped",
            EventKind::WorkSessionCompleted => "work_session_completed",
            EventKind::BreakSessionCompleted => "break_session_completed",
            EventKind::TimerStopped => "timer_stopped",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::TimerStarted { .. } => EventKind::TimerStarted,
            Event::TimerPaused { .. } => EventKind::TimerPaused,
            Event::TimerResumed { .. } => EventKind::TimerResumed,
            Event::TimerReset { .. } => EventKind::TimerReset,
            Event::TimerSkipped { .. } => EventKind::TimerSkipped,
            Event::WorkSessionCompleted { .. } => EventKind::WorkSessionCompleted,
            Event::BreakSessionCompleted { .. } => EventKind::BreakSessionCompleted,
            Event::TimerStopped { .. } => EventKind::TimerStopped,
        }
    }

    /// The task the event concerns, if one was active.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Event::TimerStarted { task_id, .. } => Some(task_id.as_str()),
            Event::TimerPaused { task_id, .. }
            | Event::TimerResumed { task_id, .. }
            | Event::TimerReset { task_id, .. }
            | Event::TimerSkipped { task_id, .. }
            | Event::WorkSessionCompleted { task_id, .. }
            | Event::BreakSessionCompleted { task_id, .. }
            | Event::TimerStopped { task_id, .. } => task_id.as_deref(),
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TimerStarted { at, .. }
            | Event::TimerPaused { at, .. }
            | Event::TimerResumed { at, .. }
            | Event::TimerReset { at, .. }
            | Event::TimerSkipped { at, .. }
            | Event::WorkSessionCompleted { at, .. }
            | Event::BreakSessionCompleted { at, .. }
            | Event::TimerStopped { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = Event::BreakSessionCompleted {
            task_id: Some("t1".into()),
            at: "2024-03-04T10:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "break_session_completed");
        assert_eq!(json["task_id"], "t1");
    }

    #[test]
    fn kind_tag_matches_serde_tag() {
        let event = Event::TimerStarted {
            task_id: "t1".into(),
            duration_secs: 1500,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.kind().as_str());
        assert_eq!(event.task_id(), Some("t1"));
    }
}
