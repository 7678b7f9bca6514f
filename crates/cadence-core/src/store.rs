//! Review state persistence seam
//!
//! The core never performs I/O. [`ReviewStore`] is the narrow interface the
//! review pipeline needs from whatever holds memory cards, quiz attempts and
//! tasks. [`InMemoryStore`] is a serde-serializable implementation used by
//! tests and by the CLI's JSON state file.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fsrs::MemoryCard;
use crate::grading::AttemptRecord;
use crate::review::AdaptiveReviewTask;

// ============================================================================
// ERRORS
// ============================================================================

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Snapshot could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Failure reported by the backing store
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Store result type
pub type Result<T> = std::result::Result<T, StoreError>;

// ============================================================================
// TRAIT
// ============================================================================

/// Persistence operations used by the adaptive review pipeline.
///
/// Implementations hold the state of a single learner; cards are keyed by
/// section id. The pipeline calls [`insert_review_task`](Self::insert_review_task)
/// before [`save_card`](Self::save_card), so a rejected task leaves the card
/// at its previous state.
pub trait ReviewStore {
    /// Memory card for a section, if one was ever saved
    fn load_card(&self, section_id: &str) -> Result<Option<MemoryCard>>;

    /// Insert or replace the card for `card.section_id`
    fn save_card(&mut self, card: &MemoryCard) -> Result<()>;

    /// Attempts for a section at or after `since`
    fn attempts_since(&self, section_id: &str, since: DateTime<Utc>) -> Result<Vec<AttemptRecord>>;

    /// Persist a newly generated REVIEW task
    fn insert_review_task(&mut self, task: &AdaptiveReviewTask) -> Result<()>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InMemoryStore {
    cards: BTreeMap<String, MemoryCard>,
    attempts: Vec<AttemptRecord>,
    review_tasks: Vec<AdaptiveReviewTask>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn record_attempt(&mut self, attempt: AttemptRecord) {
        self.attempts.push(attempt);
    }

    pub fn card(&self, section_id: &str) -> Option<&MemoryCard> {
        self.cards.get(section_id)
    }

    pub fn cards(&self) -> impl Iterator<Item = &MemoryCard> {
        self.cards.values()
    }

    /// Cards belonging to one course, for feeding back into planning
    pub fn cards_for_course(&self, course_id: &str) -> Vec<MemoryCard> {
        self.cards
            .values()
            .filter(|card| card.course_id == course_id)
            .cloned()
            .collect()
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    pub fn review_tasks(&self) -> &[AdaptiveReviewTask] {
        &self.review_tasks
    }
}

impl ReviewStore for InMemoryStore {
    fn load_card(&self, section_id: &str) -> Result<Option<MemoryCard>> {
        Ok(self.cards.get(section_id).cloned())
    }

    fn save_card(&mut self, card: &MemoryCard) -> Result<()> {
        self.cards.insert(card.section_id.clone(), card.clone());
        Ok(())
    }

    fn attempts_since(&self, section_id: &str, since: DateTime<Utc>) -> Result<Vec<AttemptRecord>> {
        Ok(self
            .attempts
            .iter()
            .filter(|a| a.section_id == section_id && a.attempted_at >= since)
            .cloned()
            .collect())
    }

    fn insert_review_task(&mut self, task: &AdaptiveReviewTask) -> Result<()> {
        self.review_tasks.push(task.clone());
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
