//! Adaptive review scheduling
//!
//! Runs when a REVIEW task is completed:
//! 1. Load the section's memory card (blank if none)
//! 2. Grade the recent quiz attempts
//! 3. Apply the grade to the card and persist it
//! 4. Emit the next REVIEW task at the card's new due date
//!
//! Failures never reach the learner. [`ReviewScheduler::on_task_updated`]
//! logs them and the static revision policy keeps the plan usable.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PlannerConfig;
use crate::fsrs::{Grade, MemoryCard, MemoryScheduler, ReviewTarget};
use crate::grading::{AttemptStats, PerformanceGrader};
use crate::plan::WorkUnitType;
use crate::store::{ReviewStore, StoreError};

// ============================================================================
// DURATION
// ============================================================================

pub const MIN_ADAPTIVE_REVIEW_MINUTES: u32 = 10;
pub const MAX_ADAPTIVE_REVIEW_MINUTES: u32 = 30;

/// Review length for a card difficulty (1-10):
/// `clamp(round(10 + difficulty / 10 * 20), 10, 30)`
pub fn adaptive_review_minutes(difficulty: f64) -> u32 {
    if !difficulty.is_finite() {
        return MIN_ADAPTIVE_REVIEW_MINUTES;
    }
    (10.0 + difficulty / 10.0 * 20.0).round().clamp(
        f64::from(MIN_ADAPTIVE_REVIEW_MINUTES),
        f64::from(MAX_ADAPTIVE_REVIEW_MINUTES),
    ) as u32
}

// ============================================================================
// EVENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Skipped,
}

/// A task's status moved from `previous` to `current`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusChange {
    pub task_id: String,
    pub course_id: String,
    #[serde(rename = "type")]
    pub task_type: WorkUnitType,
    #[serde(default)]
    pub title: String,
    pub section_ids: Vec<String>,
    pub previous: TaskStatus,
    pub current: TaskStatus,
    pub changed_at: DateTime<Utc>,
}

impl TaskStatusChange {
    /// The completed review this change represents, if any. Only a REVIEW
    /// task moving into DONE from another status counts.
    pub fn completed_review(&self) -> Option<CompletedReview> {
        let fires = self.task_type == WorkUnitType::Review
            && self.previous != TaskStatus::Done
            && self.current == TaskStatus::Done;
        if !fires {
            return None;
        }
        Some(CompletedReview {
            task_id: self.task_id.clone(),
            course_id: self.course_id.clone(),
            section_id: self.section_ids.first().cloned().unwrap_or_default(),
            title: self.title.clone(),
            completed_at: self.changed_at,
        })
    }
}

/// A REVIEW task the learner finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedReview {
    pub task_id: String,
    pub course_id: String,
    pub section_id: String,
    /// Title of the finished task, reused for the next one
    #[serde(default)]
    pub title: String,
    pub completed_at: DateTime<Utc>,
}

// ============================================================================
// OUTPUT
// ============================================================================

/// REVIEW task generated from a memory card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveReviewTask {
    pub id: String,
    pub course_id: String,
    #[serde(rename = "type")]
    pub task_type: WorkUnitType,
    pub title: String,
    pub section_ids: Vec<String>,
    pub est_minutes: u32,
    pub due_date: NaiveDate,
    pub due_at: DateTime<Utc>,
    pub status: TaskStatus,
    pub adaptive: bool,
    /// The completed task that produced this one
    pub source_task_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub grade: Grade,
    pub stats: AttemptStats,
    pub elapsed_days: f64,
    pub card: MemoryCard,
    pub task: AdaptiveReviewTask,
}

/// Review pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Invalid review event: {0}")]
    InvalidEvent(String),
}

// ============================================================================
// SCHEDULER
// ============================================================================

#[derive(Debug, Clone)]
pub struct ReviewScheduler {
    memory: MemoryScheduler,
    grader: PerformanceGrader,
    target: ReviewTarget,
    lookback_days: u32,
}

impl Default for ReviewScheduler {
    fn default() -> Self {
        Self::new(&PlannerConfig::default())
    }
}

impl ReviewScheduler {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            memory: MemoryScheduler::new(config.fsrs.clone()),
            grader: PerformanceGrader::new(config.grading),
            target: config.review_target,
            lookback_days: config.attempt_lookback_days,
        }
    }

    pub fn memory(&self) -> &MemoryScheduler {
        &self.memory
    }

    pub fn target(&self) -> &ReviewTarget {
        &self.target
    }

    /// Run the pipeline for one completed review
    pub fn process<S: ReviewStore + ?Sized>(
        &self,
        store: &mut S,
        review: &CompletedReview,
    ) -> Result<ReviewOutcome, ReviewError> {
        if review.section_id.trim().is_empty() {
            return Err(ReviewError::InvalidEvent(format!(
                "review task {} has no section",
                review.task_id
            )));
        }
        let now = review.completed_at;

        let card = store
            .load_card(&review.section_id)?
            .unwrap_or_else(|| MemoryCard::new(&review.section_id, &review.course_id));
        let elapsed_days = card.elapsed_days_at(now);

        let since = now - Duration::days(i64::from(self.lookback_days));
        let attempts = store.attempts_since(&review.section_id, since)?;
        let stats = AttemptStats::from_attempts(&attempts);
        let grade = self.grader.grade(&stats);

        let card = self
            .memory
            .review_card(&card, grade, elapsed_days, &self.target, now);

        let due_at = card
            .next_review
            .unwrap_or_else(|| now + Duration::days(i64::from(card.interval)));
        let title = if review.title.trim().is_empty() {
            format!("{}: {}", WorkUnitType::Review.title_prefix(), review.section_id)
        } else {
            review.title.clone()
        };
        let task = AdaptiveReviewTask {
            id: Uuid::new_v4().to_string(),
            course_id: review.course_id.clone(),
            task_type: WorkUnitType::Review,
            title,
            section_ids: vec![review.section_id.clone()],
            est_minutes: adaptive_review_minutes(card.difficulty),
            due_date: due_at.date_naive(),
            due_at,
            status: TaskStatus::Todo,
            adaptive: true,
            source_task_id: review.task_id.clone(),
        };
        // task first: a failed insert leaves the card unadvanced so a retry regrades it
        store.insert_review_task(&task)?;
        store.save_card(&card)?;

        tracing::info!(
            section_id = review.section_id.as_str(),
            grade = grade.as_str(),
            attempts = stats.count,
            interval = card.interval,
            due = %task.due_date,
            "Scheduled adaptive review"
        );

        Ok(ReviewOutcome {
            grade,
            stats,
            elapsed_days,
            card,
            task,
        })
    }

    /// [`process`](Self::process), with failures logged instead of returned
    pub fn on_review_completed<S: ReviewStore + ?Sized>(
        &self,
        store: &mut S,
        review: &CompletedReview,
    ) -> Option<ReviewOutcome> {
        match self.process(store, review) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(
                    task_id = review.task_id.as_str(),
                    section_id = review.section_id.as_str(),
                    "Adaptive review scheduling failed: {}",
                    e
                );
                None
            }
        }
    }

    /// Task status trigger. Ignores anything but a REVIEW task becoming DONE.
    pub fn on_task_updated<S: ReviewStore + ?Sized>(
        &self,
        store: &mut S,
        change: &TaskStatusChange,
    ) -> Option<ReviewOutcome> {
        let review = change.completed_review()?;
        self.on_review_completed(store, &review)
    }
}

// ============================================================================
// TESTS
// ============================================================================
