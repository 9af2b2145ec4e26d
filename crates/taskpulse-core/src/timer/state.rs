use serde::{Deserialize, Serialize};

/// Longest configurable session, in minutes.
pub const MAX_SESSION_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Work,
    Break,
}

/// Derived view of the timer's state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "mode", rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running(TimerMode),
    Paused(TimerMode),
}

/// Work and break lengths in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_duration")]
    pub work_duration: u32,
    #[serde(default = "default_break_duration")]
    pub break_duration: u32,
}

fn default_work_duration() -> u32 {
    25
}
fn default_break_duration() -> u32 {
    5
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            break_duration: default_break_duration(),
        }
    }
}

impl TimerConfig {
    pub fn new(work_duration: u32, break_duration: u32) -> Self {
        Self {
            work_duration,
            break_duration,
        }
        .clamped()
    }

    /// Durations forced into `1..=MAX_SESSION_MINUTES`.
    pub fn clamped(self) -> Self {
        Self {
            work_duration: self.work_duration.clamp(1, MAX_SESSION_MINUTES),
            break_duration: self.break_duration.clamp(1, MAX_SESSION_MINUTES),
        }
    }

    pub fn minutes_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Work => self.work_duration,
            TimerMode::Break => self.break_duration,
        }
    }

    pub fn seconds_for(&self, mode: TimerMode) -> u32 {
        self.minutes_for(mode).saturating_mul(60)
    }
}

/// Live timer state. Mutated only through [`super::TimerEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    #[serde(default)]
    pub active_task_id: Option<String>,
    pub mode: TimerMode,
    pub remaining_seconds: u32,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub session_count: u32,
}

impl TimerState {
    /// Fresh state: idle, work mode, a full work session on the clock.
    pub fn new(config: &TimerConfig) -> Self {
        Self {
            active_task_id: None,
            mode: TimerMode::Work,
            remaining_seconds: config.seconds_for(TimerMode::Work),
            running: false,
            session_count: 0,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        if self.running {
            TimerPhase::Running(self.mode)
        } else if self.active_task_id.is_some() {
            TimerPhase::Paused(self.mode)
        } else {
            TimerPhase::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_idle_with_full_work_session() {
        let state = TimerState::new(&TimerConfig::default());
        assert_eq!(state.phase(), TimerPhase::Idle);
        assert_eq!(state.mode, TimerMode::Work);
        assert_eq!(state.remaining_seconds, 25 * 60);
        assert_eq!(state.session_count, 0);
    }

    #[test]
    fn durations_are_clamped() {
        let config = TimerConfig::new(0, 100_000);
        assert_eq!(config.work_duration, 1);
        assert_eq!(config.break_duration, MAX_SESSION_MINUTES);
    }

    #[test]
    fn phase_serializes_with_mode() {
        let json = serde_json::to_string(&TimerPhase::Paused(TimerMode::Break)).unwrap();
        assert_eq!(json, r#"{"phase":"paused","mode":"break"}"#);
    }
}
