mod engine;
mod sampler;
mod state;
mod ticker;

pub use engine::TimerEngine;
pub use sampler::{FixedSampler, OutcomeSampler, RandomSampler, SamplerConfig};
pub use state::{TimerConfig, TimerMode, TimerPhase, TimerState, MAX_SESSION_MINUTES};
pub use ticker::Ticker;
