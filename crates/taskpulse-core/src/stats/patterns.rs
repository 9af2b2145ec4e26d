//! Productivity pattern analysis.
//!
//! Groups every productivity sample in the ledger by an hour of day, finds the
//! hours with the best mean productivity and suggests a session length based
//! on how long the most productive sessions lasted.
//!
//! ## Hour resolution
//!
//! A sample is attributed to the hour its owning task was created. Samples
//! whose task is no longer in the task set fall back to the hour of the time
//! entry recorded at the same position, then to `fallback_base_hour + index`.
//!
//! ## Cold start
//!
//! With no samples at all, each task contributes one synthetic sample derived
//! from its status at its creation hour, so a new user still gets suggestions.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::clock::local_time;
use crate::ledger::Ledger;
use crate::task::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of peak hours to report
    pub peak_hour_count: usize,
    /// Samples strictly above this feed the optimal duration
    pub high_productivity_threshold: u8,
    /// Suggested duration when no high-productivity sample has recorded time
    pub default_session_minutes: u32,
    /// First fallback hour for samples with no task or time entry
    pub fallback_base_hour: u32,
    /// Offset applied to UTC timestamps before taking the hour. Deadline
    /// scoring uses it for the local calendar day.
    pub utc_offset_minutes: i32,
    pub seed_completed: u8,
    pub seed_in_progress: u8,
    pub seed_not_started: u8,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            peak_hour_count: 3,
            high_productivity_threshold: 70,
            default_session_minutes: 25,
            fallback_base_hour: 9,
            utc_offset_minutes: 0,
            seed_completed: 85,
            seed_in_progress: 60,
            seed_not_started: 40,
        }
    }
}

/// Mean productivity observed at one hour of day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourBucket {
    pub hour: u32,
    pub average: u8,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSuggestion {
    pub hour: u32,
    pub average_productivity: u8,
    pub suggested_duration_minutes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternReport {
    /// Histogram in first-seen order.
    pub hourly: Vec<HourBucket>,
    /// Best hours, highest mean first.
    pub peak_hours: Vec<u32>,
    pub optimal_duration_minutes: u32,
    pub suggestions: Vec<ScheduleSuggestion>,
    /// True when the report was built from synthetic status-based samples.
    pub cold_start: bool,
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    hour: u32,
    productivity: u8,
    minutes: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct PatternAnalyzer {
    config: AnalysisConfig,
}

impl PatternAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&self, tasks: &[Task], ledger: &Ledger) -> PatternReport {
        let mut cold_start = false;
        let mut observations = self.recorded_observations(tasks, ledger);
        if observations.is_empty() && !tasks.is_empty() {
            observations = self.seed_observations(tasks, ledger);
            cold_start = true;
        }

        let hourly = histogram(&observations);
        let peak_hours = self.peak_hours(&hourly);
        let optimal_duration_minutes = self.optimal_duration(&observations);
        let suggestions = peak_hours
            .iter()
            .filter_map(|hour| hourly.iter().find(|b| b.hour == *hour))
            .map(|bucket| ScheduleSuggestion {
                hour: bucket.hour,
                average_productivity: bucket.average,
                suggested_duration_minutes: optimal_duration_minutes,
            })
            .collect();

        PatternReport {
            hourly,
            peak_hours,
            optimal_duration_minutes,
            suggestions,
            cold_start,
        }
    }

    fn recorded_observations(&self, tasks: &[Task], ledger: &Ledger) -> Vec<Observation> {
        let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
        let productivity = ledger.productivity_map();

        // Known tasks in task-set order, then samples whose task is gone.
        let mut seen = HashSet::new();
        let order = tasks
            .iter()
            .map(|t| t.id.as_str())
            .chain(productivity.keys().map(String::as_str))
            .filter(|id| productivity.contains_key(*id) && seen.insert(*id));

        let mut observations = Vec::new();
        for id in order {
            let task = by_id.get(id).copied();
            let record = ledger.time_spent(id);
            for (index, &value) in ledger.productivity(id).sessions.iter().enumerate() {
                let entry = record.sessions.get(index);
                let hour = match task_anchor(task) {
                    Some(at) => self.local_hour(at),
                    None => entry
                        .map(|e| self.local_hour(e.date))
                        .unwrap_or_else(|| self.fallback_hour(index)),
                };
                observations.push(Observation {
                    hour,
                    productivity: value,
                    minutes: entry.map(|e| e.duration_minutes).filter(|m| *m > 0),
                });
            }
        }
        observations
    }

    fn seed_observations(&self, tasks: &[Task], ledger: &Ledger) -> Vec<Observation> {
        tasks
            .iter()
            .map(|task| {
                let total = ledger.time_spent(&task.id).total;
                Observation {
                    hour: self.local_hour(task.created_at),
                    productivity: match task.status {
                        TaskStatus::Completed => self.config.seed_completed,
                        TaskStatus::InProgress => self.config.seed_in_progress,
                        TaskStatus::NotStarted => self.config.seed_not_started,
                    },
                    minutes: u32::try_from(total).ok().filter(|m| *m > 0),
                }
            })
            .collect()
    }

    fn peak_hours(&self, hourly: &[HourBucket]) -> Vec<u32> {
        let mut ranked: Vec<&HourBucket> = hourly.iter().collect();
        ranked.sort_by(|a, b| b.average.cmp(&a.average));
        ranked
            .into_iter()
            .take(self.config.peak_hour_count)
            .map(|b| b.hour)
            .collect()
    }

    fn optimal_duration(&self, observations: &[Observation]) -> u32 {
        let minutes: Vec<u32> = observations
            .iter()
            .filter(|o| o.productivity > self.config.high_productivity_threshold)
            .filter_map(|o| o.minutes)
            .collect();
        if minutes.is_empty() {
            return self.config.default_session_minutes;
        }
        let sum: u64 = minutes.iter().map(|&m| u64::from(m)).sum();
        (sum as f64 / minutes.len() as f64).round() as u32
    }

    fn local_hour(&self, at: DateTime<Utc>) -> u32 {
        local_time(at, self.config.utc_offset_minutes).hour()
    }

    fn fallback_hour(&self, index: usize) -> u32 {
        ((self.config.fallback_base_hour as usize + index) % 24) as u32
    }
}

/// Timestamp a task's samples are attributed to. Every task carries a
/// creation time, so a known task never needs its deadline here.
fn task_anchor(task: Option<&Task>) -> Option<DateTime<Utc>> {
    task.map(|t| t.created_at)
}

fn histogram(observations: &[Observation]) -> Vec<HourBucket> {
    let mut sums: Vec<(u32, u64, usize)> = Vec::new();
    for obs in observations {
        match sums.iter_mut().find(|(hour, _, _)| *hour == obs.hour) {
            Some((_, sum, count)) => {
                *sum += u64::from(obs.productivity);
                *count += 1;
            }
            None => sums.push((obs.hour, u64::from(obs.productivity), 1)),
        }
    }
    sums.into_iter()
        .map(|(hour, sum, count)| HourBucket {
            hour,
            average: (sum as f64 / count as f64).round() as u8,
            samples: count,
        })
        .collect()
}
