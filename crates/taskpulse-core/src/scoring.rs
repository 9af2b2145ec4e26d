//! Task priority scoring.
//!
//! Additive weighted model over a task and its ledger history:
//!
//! | Term         | Condition                          | Points (default) |
//! |--------------|------------------------------------|------------------|
//! | priority     | high / medium / low                | 50 / 30 / 10     |
//! | deadline     | overdue / today / tomorrow         | 40 / 35 / 30     |
//! |              | within 3 days / 7 days / later     | 25 / 20 / 10     |
//! | status       | in progress / completed            | +15 / -15        |
//! | productivity | average > 70 / > 50                | 15 / 10          |
//! | time         | more than 60 minutes invested      | 10               |
//!
//! Scores map onto four buckets (urgent, important, routine, optional).
//! Scoring is pure: the current time is always passed in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clock::local_time;
use crate::ledger::Ledger;
use crate::task::{Task, TaskPriority, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Urgent,
    Important,
    Routine,
    Optional,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::Urgent,
        Bucket::Important,
        Bucket::Routine,
        Bucket::Optional,
    ];
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Urgent => write!(f, "urgent"),
            Bucket::Important => write!(f, "important"),
            Bucket::Routine => write!(f, "routine"),
            Bucket::Optional => write!(f, "optional"),
        }
    }
}

/// Point values for each scoring term.
///
/// Two presets exist because the completed-task penalty differs between the
/// task list (-15) and the dashboard (-30).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub priority_high: i32,
    pub priority_medium: i32,
    pub priority_low: i32,
    pub deadline_overdue: i32,
    pub deadline_today: i32,
    pub deadline_tomorrow: i32,
    pub deadline_three_days: i32,
    pub deadline_week: i32,
    pub deadline_later: i32,
    pub in_progress_bonus: i32,
    pub completed_penalty: i32,
    pub high_productivity_bonus: i32,
    pub high_productivity_threshold: u8,
    pub medium_productivity_bonus: i32,
    pub medium_productivity_threshold: u8,
    pub time_invested_bonus: i32,
    pub time_invested_threshold_minutes: u64,
}

impl ScoringWeights {
    /// Weights used for the task list ranking.
    pub fn task_list() -> Self {
        Self {
            priority_high: 50,
            priority_medium: 30,
            priority_low: 10,
            deadline_overdue: 40,
            deadline_today: 35,
            deadline_tomorrow: 30,
            deadline_three_days: 25,
            deadline_week: 20,
            deadline_later: 10,
            in_progress_bonus: 15,
            completed_penalty: -15,
            high_productivity_bonus: 15,
            high_productivity_threshold: 70,
            medium_productivity_bonus: 10,
            medium_productivity_threshold: 50,
            time_invested_bonus: 10,
            time_invested_threshold_minutes: 60,
        }
    }

    /// Dashboard weights: completed work sinks harder.
    pub fn dashboard() -> Self {
        Self {
            completed_penalty: -30,
            ..Self::task_list()
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::task_list()
    }
}

/// Lower bounds (inclusive) of each bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketThresholds {
    pub urgent: i32,
    pub important: i32,
    pub routine: i32,
}

impl Default for BucketThresholds {
    fn default() -> Self {
        Self {
            urgent: 70,
            important: 50,
            routine: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    pub thresholds: BucketThresholds,
}

/// One contributing term of a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTerm {
    pub name: String,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub task_id: String,
    pub score: i32,
    pub bucket: Bucket,
    /// Non-zero terms in evaluation order.
    pub breakdown: Vec<ScoreTerm>,
}

/// Tasks partitioned by bucket, each list sorted by descending score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub urgent: Vec<ScoreResult>,
    pub important: Vec<ScoreResult>,
    pub routine: Vec<ScoreResult>,
    pub optional: Vec<ScoreResult>,
}

impl Classification {
    pub fn bucket(&self, bucket: Bucket) -> &[ScoreResult] {
        match bucket {
            Bucket::Urgent => &self.urgent,
            Bucket::Important => &self.important,
            Bucket::Routine => &self.routine,
            Bucket::Optional => &self.optional,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<ScoreResult> {
        match bucket {
            Bucket::Urgent => &mut self.urgent,
            Bucket::Important => &mut self.important,
            Bucket::Routine => &mut self.routine,
            Bucket::Optional => &mut self.optional,
        }
    }

    pub fn len(&self) -> usize {
        Bucket::ALL.iter().map(|b| self.bucket(*b).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All results, urgent first.
    pub fn iter(&self) -> impl Iterator<Item = &ScoreResult> {
        Bucket::ALL.into_iter().flat_map(move |b| self.bucket(b).iter())
    }
}

/// Whole local calendar days from `now` to `deadline`. Negative when overdue.
pub fn deadline_days(
    deadline: DateTime<Utc>,
    now: DateTime<Utc>,
    utc_offset_minutes: i32,
) -> i64 {
    let deadline = local_time(deadline, utc_offset_minutes).date();
    let today = local_time(now, utc_offset_minutes).date();
    (deadline - today).num_days()
}

#[derive(Debug, Clone, Default)]
pub struct PriorityScorer {
    config: ScoringConfig,
    utc_offset_minutes: i32,
}

impl PriorityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            utc_offset_minutes: 0,
        }
    }

    /// Count deadline days in local time at this UTC offset.
    pub fn with_utc_offset(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self::new(ScoringConfig {
            weights,
            ..ScoringConfig::default()
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, task: &Task, ledger: &Ledger, now: DateTime<Utc>) -> ScoreResult {
        let w = &self.config.weights;
        let mut breakdown = Vec::new();
        let mut add = |name: &str, points: i32| {
            if points != 0 {
                breakdown.push(ScoreTerm {
                    name: name.to_string(),
                    points,
                });
            }
        };

        add(
            "priority",
            match task.priority {
                TaskPriority::High => w.priority_high,
                TaskPriority::Medium => w.priority_medium,
                TaskPriority::Low => w.priority_low,
            },
        );

        if let Some(deadline) = task.deadline {
            let days = deadline_days(deadline, now, self.utc_offset_minutes);
            add("deadline", self.deadline_points(days));
        }

        add(
            "status",
            match task.status {
                TaskStatus::InProgress => w.in_progress_bonus,
                TaskStatus::Completed => w.completed_penalty,
                TaskStatus::NotStarted => 0,
            },
        );

        let average = ledger.productivity(&task.id).average;
        add(
            "productivity",
            if average > w.high_productivity_threshold {
                w.high_productivity_bonus
            } else if average > w.medium_productivity_threshold {
                w.medium_productivity_bonus
            } else {
                0
            },
        );

        if ledger.time_spent(&task.id).total > w.time_invested_threshold_minutes {
            add("time_invested", w.time_invested_bonus);
        }

        let score = breakdown.iter().map(|t| t.points).sum();
        ScoreResult {
            task_id: task.id.clone(),
            score,
            bucket: self.bucket_for(score),
            breakdown,
        }
    }

    pub fn bucket_for(&self, score: i32) -> Bucket {
        let t = &self.config.thresholds;
        if score >= t.urgent {
            Bucket::Urgent
        } else if score >= t.important {
            Bucket::Important
        } else if score >= t.routine {
            Bucket::Routine
        } else {
            Bucket::Optional
        }
    }

    /// Score every task, highest first. Ties keep input order.
    pub fn rank(&self, tasks: &[Task], ledger: &Ledger, now: DateTime<Utc>) -> Vec<ScoreResult> {
        let mut results: Vec<ScoreResult> =
            tasks.iter().map(|t| self.score(t, ledger, now)).collect();
        results.sort_by(|a, b| b.score.cmp(&a.score));
        results
    }

    /// Partition tasks into buckets. Every task lands in exactly one bucket.
    pub fn classify(&self, tasks: &[Task], ledger: &Ledger, now: DateTime<Utc>) -> Classification {
        let mut classification = Classification::default();
        for result in self.rank(tasks, ledger, now) {
            classification.bucket_mut(result.bucket).push(result);
        }
        classification
    }

    fn deadline_points(&self, days: i64) -> i32 {
        let w = &self.config.weights;
        match days {
            d if d < 0 => w.deadline_overdue,
            0 => w.deadline_today,
            1 => w.deadline_tomorrow,
            2..=3 => w.deadline_three_days,
            4..=7 => w.deadline_week,
            _ => w.deadline_later,
        }
    }
}
