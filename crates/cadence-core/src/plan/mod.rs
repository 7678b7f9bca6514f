//! Study plan generation
//!
//! Turns analyzed sections into a dated workload:
//! sections -> work units -> capacity calendar -> feasibility -> placement.
//!
//! Every step is a pure function over owned data. [`StudyPlanner`] runs the
//! whole pipeline for callers that do not need the intermediate values.

mod catchup;
mod feasibility;
mod placer;
mod titles;
mod units;

pub use catchup::{
    CATCH_UP_PRIORITY, CatchUpRedistributor, OverdueItem, RedistributedTask, distribute_overdue,
};
pub use feasibility::{FeasibilityReport, Suggestion, check_feasibility};
pub use placer::{
    DropReason, DroppedUnit, OverflowPolicy, PlacedTask, Placement, TaskPlacer, place_tasks,
};
pub use titles::{derive_title, is_generic_title};
pub use units::{
    MAX_SECTION_DIFFICULTY, MAX_STUDY_MINUTES, MIN_QUESTIONS_MINUTES, MIN_SECTION_DIFFICULTY,
    MIN_STUDY_MINUTES, QUESTIONS_TIME_RATIO, QuestionsStatus, Section, WorkUnit, WorkUnitType,
    build_work_units, compute_total_load, questions_minutes,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::build_day_capacities;
use crate::config::{AvailabilityConfig, ConfigError, PlannerConfig, RevisionPolicy};
use crate::fsrs::MemoryCard;

// ============================================================================
// REQUEST / OUTCOME
// ============================================================================

/// Everything one scheduling run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub course_id: String,
    pub today: NaiveDate,
    /// Exam date; the default study period applies when absent
    #[serde(default)]
    pub horizon: Option<NaiveDate>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub availability: AvailabilityConfig,
    #[serde(default)]
    pub revision_policy: RevisionPolicy,
    #[serde(default)]
    pub memory_cards: Vec<MemoryCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanOutcome {
    /// Work fits; tasks were placed
    Scheduled {
        feasibility: FeasibilityReport,
        placement: Placement,
    },
    /// Work does not fit; nothing was placed
    Infeasible { feasibility: FeasibilityReport },
}

impl PlanOutcome {
    pub fn feasibility(&self) -> &FeasibilityReport {
        match self {
            PlanOutcome::Scheduled { feasibility, .. } => feasibility,
            PlanOutcome::Infeasible { feasibility } => feasibility,
        }
    }

    pub fn placement(&self) -> Option<&Placement> {
        match self {
            PlanOutcome::Scheduled { placement, .. } => Some(placement),
            PlanOutcome::Infeasible { .. } => None,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self, PlanOutcome::Scheduled { .. })
    }
}

// ============================================================================
// PLANNER
// ============================================================================

/// Full pipeline over a validated configuration
#[derive(Debug, Clone)]
pub struct StudyPlanner {
    config: PlannerConfig,
    overflow: OverflowPolicy,
}

impl StudyPlanner {
    pub fn new(config: PlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            overflow: OverflowPolicy::default(),
        })
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Run one scheduling pass. An infeasible load is reported without
    /// placing anything.
    pub fn plan(&self, request: &PlanRequest) -> PlanOutcome {
        let units = build_work_units(
            &request.sections,
            &request.course_id,
            request.revision_policy,
            &request.memory_cards,
            &self.config,
        );
        let total = compute_total_load(&units);

        let availability = request.availability.sanitize(&self.config);
        let days =
            build_day_capacities(request.today, request.horizon, &availability, &self.config);

        let feasibility = check_feasibility(total, &days);
        if !feasibility.feasible {
            tracing::info!(
                course_id = request.course_id.as_str(),
                deficit = feasibility.deficit_minutes,
                "Plan infeasible"
            );
            return PlanOutcome::Infeasible { feasibility };
        }

        let placement = TaskPlacer::new(&self.config)
            .with_overflow(self.overflow)
            .place(units, days);
        tracing::info!(
            course_id = request.course_id.as_str(),
            tasks = placement.tasks.len(),
            dropped = placement.dropped.len(),
            "Plan scheduled"
        );
        PlanOutcome::Scheduled {
            feasibility,
            placement,
        }
    }
}

impl Default for StudyPlanner {
    fn default() -> Self {
        Self {
            config: PlannerConfig::default(),
            overflow: OverflowPolicy::default(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
