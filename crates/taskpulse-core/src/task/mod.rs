//! Task types read by the engine.
//!
//! Tasks are owned by the task-management collaborator. The engine resolves
//! ids against the current task set and reads priority, status, deadline and
//! creation time, but never creates, edits or deletes a task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// User-assigned importance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::High => write!(f, "high"),
        }
    }
}

/// Lifecycle status as tracked by the task collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::NotStarted => write!(f, "not_started"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subtask {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
}

/// A task as seen by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        priority: TaskPriority,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            priority,
            category: String::new(),
            status: TaskStatus::NotStarted,
            deadline: None,
            created_at,
            subtasks: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_subtasks(mut self, subtasks: Vec<Subtask>) -> Self {
        self.subtasks = subtasks;
        self
    }

    /// Percentage (0-100) of completed subtasks, 0 when there are none.
    pub fn subtask_progress(&self) -> u8 {
        if self.subtasks.is_empty() {
            return 0;
        }
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        ((done as f64 / self.subtasks.len() as f64) * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
    }

    #[test]
    fn subtask_progress_rounds_to_percent() {
        let task = Task::new("t1", "Write report", TaskPriority::High, created()).with_subtasks(vec![
            Subtask { id: "a".into(), name: "Outline".into(), completed: true },
            Subtask { id: "b".into(), name: "Draft".into(), completed: false },
            Subtask { id: "c".into(), name: "Review".into(), completed: false },
        ]);
        assert_eq!(task.subtask_progress(), 33);
    }

    #[test]
    fn subtask_progress_without_subtasks_is_zero() {
        let task = Task::new("t1", "Inbox zero", TaskPriority::Low, created());
        assert_eq!(task.subtask_progress(), 0);
    }

    #[test]
    fn deserializes_collaborator_payload() {
        let json = r#"{
            "id": "t7",
            "name": "Plan sprint",
            "priority": "high",
            "category": "work",
            "status": "in_progress",
            "createdAt": "2024-03-04T10:00:00Z",
            "subtasks": [{"id": "s1", "name": "Backlog", "completed": true}]
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.created_at, created());
        assert!(task.deadline.is_none());
        assert_eq!(task.subtask_progress(), 100);
    }

    #[test]
    fn status_display_matches_wire_names() {
        assert_eq!(TaskStatus::NotStarted.to_string(), "not_started");
        assert_eq!(TaskPriority::Medium.to_string(), "medium");
    }
}
