//! Outcome sampling for naturally completed work sessions.
//!
//! A completed session records a progress and a productivity value. Nothing
//! measures either yet, so the default sampler draws them from configured
//! ranges. Tests inject [`FixedSampler`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub trait OutcomeSampler {
    /// Progress (0-100) credited to the session that just finished.
    fn progress(&mut self) -> u8;
    /// Productivity (0-100) credited to the session that just finished.
    fn productivity(&mut self) -> u8;
}

/// Inclusive sampling ranges, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    #[serde(default = "default_progress_min")]
    pub progress_min: u8,
    #[serde(default = "default_progress_max")]
    pub progress_max: u8,
    #[serde(default = "default_productivity_min")]
    pub productivity_min: u8,
    #[serde(default = "default_productivity_max")]
    pub productivity_max: u8,
}

fn default_progress_min() -> u8 {
    70
}
fn default_progress_max() -> u8 {
    100
}
fn default_productivity_min() -> u8 {
    60
}
fn default_productivity_max() -> u8 {
    100
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            progress_min: default_progress_min(),
            progress_max: default_progress_max(),
            productivity_min: default_productivity_min(),
            productivity_max: default_productivity_max(),
        }
    }
}

fn ordered_range(a: u8, b: u8) -> (u8, u8) {
    let (a, b) = (a.min(100), b.min(100));
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Uniform draws from the configured ranges.
pub struct RandomSampler {
    progress: (u8, u8),
    productivity: (u8, u8),
    rng: StdRng,
}

impl RandomSampler {
    pub fn new(config: &SamplerConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Reproducible sampler for simulations.
    pub fn seeded(config: &SamplerConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &SamplerConfig, rng: StdRng) -> Self {
        Self {
            progress: ordered_range(config.progress_min, config.progress_max),
            productivity: ordered_range(config.productivity_min, config.productivity_max),
            rng,
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new(&SamplerConfig::default())
    }
}

impl OutcomeSampler for RandomSampler {
    fn progress(&mut self) -> u8 {
        let (lo, hi) = self.progress;
        self.rng.gen_range(lo..=hi)
    }

    fn productivity(&mut self) -> u8 {
        let (lo, hi) = self.productivity;
        self.rng.gen_range(lo..=hi)
    }
}

/// Always returns the same pair of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSampler {
    pub progress: u8,
    pub productivity: u8,
}

impl FixedSampler {
    pub fn new(progress: u8, productivity: u8) -> Self {
        Self {
            progress: progress.min(100),
            productivity: productivity.min(100),
        }
    }
}

impl OutcomeSampler for FixedSampler {
    fn progress(&mut self) -> u8 {
        self.progress
    }

    fn productivity(&mut self) -> u8 {
        self.productivity
    }
}
