//! # Cadence Core
//!
//! Adaptive study-scheduling engine. Turns analyzed course material into a
//! dated workload plan, keeps the plan feasible against the learner's time,
//! and re-times reviews from quiz performance with a memory model.
//!
//! - **Capacity Calendar**: per-day study budget with weekday overrides,
//!   excluded dates and a withheld catch-up buffer
//! - **Work Units**: STUDY / QUESTIONS / REVIEW units per section, with
//!   readable titles synthesized when extraction produced "Page 3"
//! - **Placement**: capacity-constrained bin packing in course order, with
//!   oversized units split across days and reviews anchored to study days
//! - **Catch-up**: overdue tasks re-spread over the next few days
//! - **FSRS-5**: 19-weight spaced repetition with bounded intervals
//! - **Adaptive Reviews**: quiz attempts graded into a recall grade that
//!   drives the next review
//!
//! Everything here is pure and synchronous. Persistence is behind the
//! [`ReviewStore`] trait.
//!
//! ## Quick Start
//!
//! ```rust
//! use cadence_core::prelude::*;
//! use chrono::NaiveDate;
//!
//! let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
//! let request = PlanRequest {
//!     course_id: "bio-101".to_string(),
//!     today,
//!     horizon: NaiveDate::from_ymd_opt(2026, 10, 28),
//!     sections: vec![Section {
//!         id: "s1".to_string(),
//!         title: "Cell Division".to_string(),
//!         est_minutes: 45.0,
//!         difficulty: 3.0,
//!         ..Default::default()
//!     }],
//!     availability: AvailabilityConfig::uniform(60),
//!     revision_policy: RevisionPolicy::Standard,
//!     memory_cards: Vec::new(),
//! };
//!
//! let outcome = StudyPlanner::default().plan(&request);
//! let placement = outcome.placement().expect("fits");
//! assert_eq!(placement.tasks[0].unit.title, "Study: Cell Division");
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod calendar;
pub mod config;
pub mod fsrs;
pub mod grading;
pub mod store;

/// Plan generation: work units, feasibility, placement, catch-up
pub mod plan;

/// Adaptive review pipeline triggered by completed REVIEW tasks
pub mod review;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Configuration
pub use config::{
    Availability, AvailabilityConfig, ConfigError, PlannerConfig, ReviewStep, RevisionPolicies,
    RevisionPolicy,
};

// Capacity calendar
pub use calendar::{DayCapacities, DaySlot, build_day_capacities};

// Plan generation
pub use plan::{
    CatchUpRedistributor, DropReason, DroppedUnit, FeasibilityReport, OverdueItem, OverflowPolicy,
    PlacedTask, Placement, PlanOutcome, PlanRequest, QuestionsStatus, RedistributedTask, Section,
    StudyPlanner, Suggestion, TaskPlacer, WorkUnit, WorkUnitType, build_work_units,
    check_feasibility, compute_total_load, distribute_overdue, place_tasks,
};

// Grading
pub use grading::{
    AttemptRecord, AttemptStats, GradingThresholds, PerformanceGrader, grade_from_performance,
};

// FSRS-5 memory model
pub use fsrs::{
    CardState, FsrsParameters, Grade, MemoryCard, MemoryScheduler, PreviewResults, ReviewTarget,
    retrievability, review_card,
};

// Persistence seam
pub use store::{InMemoryStore, ReviewStore, StoreError};

// Adaptive reviews
pub use review::{
    AdaptiveReviewTask, CompletedReview, ReviewError, ReviewOutcome, ReviewScheduler, TaskStatus,
    TaskStatusChange, adaptive_review_minutes,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FSRS algorithm version (5 = 19 parameters)
pub const FSRS_VERSION: u8 = 5;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        AvailabilityConfig, DayCapacities, Grade, MemoryCard, PlacedTask, PlanOutcome,
        PlanRequest, PlannerConfig, RevisionPolicy, Section, StudyPlanner, WorkUnit,
        WorkUnitType,
    };

    pub use crate::{
        CompletedReview, InMemoryStore, ReviewScheduler, ReviewStore, TaskStatus,
        TaskStatusChange,
    };
}
