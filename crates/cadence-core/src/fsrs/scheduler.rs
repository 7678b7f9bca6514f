//! Memory cards and the FSRS review transition
//!
//! State machine per section:
//!
//! ```text
//! New ──Again/Hard──▶ Learning ──Hard/Good/Easy──▶ Review
//!  └────Good/Easy──────────────────────────────────▶ Review
//! Review ──Again──▶ Relearning ──Hard/Good/Easy──▶ Review
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::{
    DEFAULT_RETENTION, FSRS5_DEFAULT_WEIGHTS, MAX_RETENTION, MIN_RETENTION, WEIGHT_COUNT, Weights,
    bounded_interval_days, initial_difficulty, initial_stability, next_difficulty,
    next_forget_stability, next_recall_stability, retrievability, sanitize_elapsed,
    short_term_stability, validate_weights,
};
use crate::config::ConfigError;

// ============================================================================
// GRADE
// ============================================================================

/// Recall quality fed to the memory model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    /// Forgot
    Again = 1,
    /// Recalled with serious difficulty
    Hard = 2,
    /// Recalled
    Good = 3,
    /// Recalled effortlessly
    Easy = 4,
}

impl Grade {
    pub const ALL: [Grade; 4] = [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy];

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Grade::Again),
            2 => Some(Grade::Hard),
            3 => Some(Grade::Good),
            4 => Some(Grade::Easy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }

    /// Numeric grade (1-4) as used by the formulas
    pub fn value(&self) -> f64 {
        f64::from(*self as u8)
    }

    /// Zero-based position, used to index the initial stability weights
    pub(crate) fn index(&self) -> usize {
        *self as usize - 1
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CARD STATE
// ============================================================================

/// Learning phase of a memory card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    /// Never reviewed
    #[default]
    New,
    /// First review went poorly; still being learned
    Learning,
    /// Graduated into spaced review
    Review,
    /// Lapsed from review; being relearned
    Relearning,
}

impl CardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        }
    }
}

impl std::fmt::Display for CardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// MEMORY CARD
// ============================================================================

/// Per-section spaced-repetition state, one per (learner, section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryCard {
    pub section_id: String,
    pub course_id: String,
    #[serde(default)]
    pub state: CardState,
    /// Days until recall probability decays to 90%
    #[serde(default)]
    pub stability: f64,
    /// Inherent difficulty (1.0 = easy, 10.0 = hard; 0.0 before the first review)
    #[serde(default)]
    pub difficulty: f64,
    /// Successful reviews
    #[serde(default)]
    pub reps: u32,
    /// Times forgotten after graduating
    #[serde(default)]
    pub lapses: u32,
    /// Current interval in whole days
    #[serde(default)]
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_review: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review: Option<DateTime<Utc>>,
}

impl MemoryCard {
    /// A blank card that has never been reviewed
    pub fn new(section_id: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self {
            section_id: section_id.into(),
            course_id: course_id.into(),
            state: CardState::New,
            stability: 0.0,
            difficulty: 0.0,
            reps: 0,
            lapses: 0,
            interval: 0,
            last_review: None,
            next_review: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.state == CardState::New
    }

    /// Whether the card carries an adaptive schedule the planner can reuse
    pub fn has_schedule(&self) -> bool {
        self.interval > 0 && self.next_review.is_some()
    }

    /// Days since the last review (0 if never reviewed or clock skew)
    pub fn elapsed_days_at(&self, now: DateTime<Utc>) -> f64 {
        self.last_review
            .map(|last| sanitize_elapsed((now - last).num_seconds() as f64 / 86_400.0))
            .unwrap_or(0.0)
    }

    /// Probability of recall right now
    pub fn retrievability_at(&self, now: DateTime<Utc>) -> f64 {
        if self.is_new() {
            return 0.0;
        }
        retrievability(self.elapsed_days_at(now), self.stability)
    }

    /// Check if the card is due for review
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review.map(|t| t <= now).unwrap_or(true)
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// FSRS weight set, injectable per deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsrsParameters {
    pub weights: Weights,
}

impl Default for FsrsParameters {
    fn default() -> Self {
        Self {
            weights: FSRS5_DEFAULT_WEIGHTS,
        }
    }
}

impl FsrsParameters {
    /// Build from a weight slice, validating length and values
    pub fn from_weights(weights: &[f64]) -> Result<Self, ConfigError> {
        validate_weights(weights).map_err(ConfigError::InvalidWeights)?;
        let mut w = [0.0; WEIGHT_COUNT];
        w.copy_from_slice(weights);
        Ok(Self { weights: w })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_weights(&self.weights).map_err(ConfigError::InvalidWeights)
    }
}

/// Retention target and interval bounds for one review
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewTarget {
    pub desired_retention: f64,
    pub min_interval_days: u32,
    pub max_interval_days: u32,
}

impl Default for ReviewTarget {
    fn default() -> Self {
        Self {
            desired_retention: DEFAULT_RETENTION,
            min_interval_days: 1,
            max_interval_days: 365,
        }
    }
}

impl ReviewTarget {
    pub fn new(desired_retention: f64, min_interval_days: u32, max_interval_days: u32) -> Self {
        Self {
            desired_retention,
            min_interval_days,
            max_interval_days,
        }
    }

    /// Interval bounds with `1 <= min <= max` enforced
    pub fn bounds(&self) -> (u32, u32) {
        let min = self.min_interval_days.max(1);
        (min, self.max_interval_days.max(min))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_RETENTION..=MAX_RETENTION).contains(&self.desired_retention) {
            return Err(ConfigError::InvalidReviewTarget(format!(
                "desiredRetention {} outside [{}, {}]",
                self.desired_retention, MIN_RETENTION, MAX_RETENTION
            )));
        }
        if self.max_interval_days == 0 {
            return Err(ConfigError::InvalidReviewTarget(
                "maxIntervalDays must be at least 1".to_string(),
            ));
        }
        if self.min_interval_days > self.max_interval_days {
            return Err(ConfigError::InvalidReviewTarget(format!(
                "minIntervalDays {} exceeds maxIntervalDays {}",
                self.min_interval_days, self.max_interval_days
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Cards each grade would produce, for "what if" displays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResults {
    pub again: MemoryCard,
    pub hard: MemoryCard,
    pub good: MemoryCard,
    pub easy: MemoryCard,
}

/// Applies FSRS reviews to memory cards
#[derive(Debug, Clone, Default)]
pub struct MemoryScheduler {
    params: FsrsParameters,
}

impl MemoryScheduler {
    pub fn new(params: FsrsParameters) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> &FsrsParameters {
        &self.params
    }

    /// Apply one graded review. See [`review_card`].
    pub fn review_card(
        &self,
        card: &MemoryCard,
        grade: Grade,
        elapsed_days: f64,
        target: &ReviewTarget,
        now: DateTime<Utc>,
    ) -> MemoryCard {
        review_card(&self.params, card, grade, elapsed_days, target, now)
    }

    /// Result of every grade, without committing to one
    pub fn preview(
        &self,
        card: &MemoryCard,
        elapsed_days: f64,
        target: &ReviewTarget,
        now: DateTime<Utc>,
    ) -> PreviewResults {
        let review = |grade| self.review_card(card, grade, elapsed_days, target, now);
        PreviewResults {
            again: review(Grade::Again),
            hard: review(Grade::Hard),
            good: review(Grade::Good),
            easy: review(Grade::Easy),
        }
    }
}

/// Apply one graded review to a card and return the updated card.
///
/// - `New` cards are initialised from the grade and move to `Learning`
///   (Again/Hard) or straight to `Review` (Good/Easy).
/// - Otherwise retrievability is computed from `elapsed_days` (clamped to
///   `>= 0`), difficulty and stability are updated, `Again` in `Review`
///   counts a lapse and moves to `Relearning`, any other grade counts a rep
///   and moves to `Review`.
/// - `Again` never raises the stability of a card that already has memory
///   state.
/// - The interval is clamped to the target's bounds, `last_review = now`
///   and `next_review = now + interval`.
pub fn review_card(
    params: &FsrsParameters,
    card: &MemoryCard,
    grade: Grade,
    elapsed_days: f64,
    target: &ReviewTarget,
    now: DateTime<Utc>,
) -> MemoryCard {
    let w = &params.weights;
    let elapsed = sanitize_elapsed(elapsed_days);
    let mut next = card.clone();

    if card.is_new() || card.stability <= 0.0 {
        next.stability = initial_stability(w, grade);
        next.difficulty = initial_difficulty(w, grade);
        next.state = match grade {
            Grade::Again | Grade::Hard => CardState::Learning,
            Grade::Good | Grade::Easy => CardState::Review,
        };
        if grade != Grade::Again {
            next.reps += 1;
        }
    } else {
        let r = retrievability(elapsed, card.stability);
        next.difficulty = next_difficulty(w, card.difficulty, grade);
        next.stability = if elapsed < 1.0 {
            short_term_stability(w, card.stability, grade)
        } else if grade == Grade::Again {
            next_forget_stability(w, card.difficulty, card.stability, r)
        } else {
            next_recall_stability(w, card.difficulty, card.stability, r, grade)
        };

        if grade == Grade::Again {
            next.stability = next.stability.min(card.stability);
            if card.state == CardState::Review {
                next.lapses += 1;
                next.state = CardState::Relearning;
            }
        } else {
            next.reps += 1;
            next.state = CardState::Review;
        }
    }

    let (min_days, max_days) = target.bounds();
    next.interval = bounded_interval_days(
        next.stability,
        target.desired_retention,
        min_days,
        max_days,
    );
    next.last_review = Some(now);
    next.next_review = Some(now + Duration::days(i64::from(next.interval)));

    tracing::debug!(
        section_id = card.section_id.as_str(),
        grade = grade.as_str(),
        from = card.state.as_str(),
        to = next.state.as_str(),
        stability = next.stability,
        interval = next.interval,
        "Reviewed memory card"
    );

    next
}

// ============================================================================
// TESTS
// ============================================================================
