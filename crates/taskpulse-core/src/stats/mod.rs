//! Statistics module for TaskPulse
//!
//! Read-side projections over the ledger. Nothing here mutates ledger or
//! task state.

mod patterns;

pub use patterns::{
    AnalysisConfig, HourBucket, PatternAnalyzer, PatternReport, ScheduleSuggestion,
};
