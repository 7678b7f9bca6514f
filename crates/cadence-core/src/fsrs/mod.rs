//! FSRS-5 (Free Spaced Repetition Scheduler) Module
//!
//! Converts a recall grade and the time since the last review into an updated
//! memory state and a bounded next-review interval.
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki
//!
//! ## Core Formulas:
//! - Retrievability: R = (1 + FACTOR * t / S)^DECAY with DECAY = -0.5, FACTOR = 19/81
//! - Interval: t = S / FACTOR * (R^(1/DECAY) - 1)
//!
//! Weights are configuration, not contract. The contract is: the interval is
//! non-decreasing in stability for a fixed retention target, always inside
//! `[min, max]`, and `Again` never raises stability.

mod algorithm;
mod scheduler;

pub use algorithm::{
    DECAY, DEFAULT_RETENTION, FACTOR, FSRS5_DEFAULT_WEIGHTS, MAX_DIFFICULTY, MAX_RETENTION,
    MAX_STABILITY, MIN_DIFFICULTY, MIN_RETENTION, MIN_STABILITY, WEIGHT_COUNT,
};
pub use algorithm::{
    Weights, bounded_interval_days, initial_difficulty, initial_stability, next_difficulty,
    next_forget_stability, next_interval, next_recall_stability, retrievability,
    sanitize_elapsed, short_term_stability, validate_weights,
};

pub use scheduler::{
    CardState, FsrsParameters, Grade, MemoryCard, MemoryScheduler, PreviewResults, ReviewTarget,
    review_card,
};
