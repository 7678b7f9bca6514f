//! Feasibility check
//!
//! Compares requested minutes against calendar capacity. Infeasibility is a
//! reported outcome, never an error, and nothing is adjusted automatically.

use serde::{Deserialize, Serialize};

use crate::calendar::DayCapacities;

/// A remediation the learner can apply to an infeasible plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Suggestion {
    /// Spread the deficit over the existing days
    #[serde(rename_all = "camelCase")]
    IncreaseDailyTime { extra_minutes_per_day: u32 },
    /// Pick a lighter revision policy
    ReduceRevisionIntensity,
    /// Add days at the current average daily capacity
    #[serde(rename_all = "camelCase")]
    ExtendStudyPeriod { extra_days: u32 },
}

impl std::fmt::Display for Suggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Suggestion::IncreaseDailyTime {
                extra_minutes_per_day,
            } => write!(
                f,
                "Increase daily study time by about {} minutes",
                extra_minutes_per_day
            ),
            Suggestion::ReduceRevisionIntensity => {
                write!(f, "Reduce revision intensity to a lighter policy")
            }
            Suggestion::ExtendStudyPeriod { extra_days } => {
                write!(f, "Extend the study period by about {} days", extra_days)
            }
        }
    }
}

/// Verdict for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityReport {
    pub feasible: bool,
    pub requested_minutes: u32,
    pub capacity_minutes: u32,
    /// `max(0, requested - capacity)`
    pub deficit_minutes: u32,
    /// Empty when feasible
    pub suggestions: Vec<Suggestion>,
}

/// `feasible` iff `total_minutes <= sum(usable_capacity)`
pub fn check_feasibility(total_minutes: u32, days: &DayCapacities) -> FeasibilityReport {
    let capacity = days.total_capacity();
    let deficit = total_minutes.saturating_sub(capacity);
    let feasible = total_minutes <= capacity;

    let suggestions = if feasible {
        Vec::new()
    } else {
        let day_count = u32::try_from(days.len()).unwrap_or(u32::MAX).max(1);
        let average = (capacity / day_count).max(1);
        vec![
            Suggestion::IncreaseDailyTime {
                extra_minutes_per_day: deficit.div_ceil(day_count),
            },
            Suggestion::ReduceRevisionIntensity,
            Suggestion::ExtendStudyPeriod {
                extra_days: deficit.div_ceil(average),
            },
        ]
    };

    tracing::info!(
        feasible,
        requested = total_minutes,
        capacity,
        deficit,
        "Feasibility checked"
    );

    FeasibilityReport {
        feasible,
        requested_minutes: total_minutes,
        capacity_minutes: capacity,
        deficit_minutes: deficit,
        suggestions,
    }
}
