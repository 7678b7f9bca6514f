//! Work units
//!
//! Expands analyzed sections into the STUDY, QUESTIONS and REVIEW units a
//! scheduling run places on the calendar.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::titles::derive_title;
use crate::config::{PlannerConfig, RevisionPolicy};
use crate::fsrs::MemoryCard;
use crate::review::adaptive_review_minutes;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const MIN_STUDY_MINUTES: u32 = 5;
pub const MAX_STUDY_MINUTES: u32 = 240;

pub const MIN_SECTION_DIFFICULTY: u8 = 1;
pub const MAX_SECTION_DIFFICULTY: u8 = 5;

/// QUESTIONS units are sized at this share of the study time
pub const QUESTIONS_TIME_RATIO: f64 = 0.35;
pub const MIN_QUESTIONS_MINUTES: u32 = 8;

// ============================================================================
// SECTION
// ============================================================================

/// Generation status of a section's practice questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionsStatus {
    #[default]
    Pending,
    Generating,
    Completed,
    Failed,
}

impl QuestionsStatus {
    /// Parse from string name. Unknown values are treated as `Pending`.
    pub fn parse_name(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "GENERATING" | "IN_PROGRESS" => QuestionsStatus::Generating,
            "COMPLETED" | "COMPLETE" | "DONE" => QuestionsStatus::Completed,
            "FAILED" | "ERROR" => QuestionsStatus::Failed,
            _ => QuestionsStatus::Pending,
        }
    }
}

impl<'de> Deserialize<'de> for QuestionsStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(QuestionsStatus::parse_name(&raw))
    }
}

/// One analyzed section of course material, as produced by ingestion.
///
/// Numbers come from AI extraction and may be out of range; they are clamped
/// when units are built, never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub est_minutes: f64,
    /// 1 (easy) to 5 (hard)
    pub difficulty: f64,
    pub topic_tags: Vec<String>,
    pub questions_status: QuestionsStatus,
    /// Position in the course material
    pub source_order: i64,
    pub key_concepts: Vec<String>,
    pub defined_terms: Vec<String>,
    pub learning_objectives: Vec<String>,
    pub high_yield_points: Vec<String>,
}

// ============================================================================
// WORK UNIT
// ============================================================================

/// Kind of planned work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkUnitType {
    Study,
    Questions,
    Review,
}

impl WorkUnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkUnitType::Study => "STUDY",
            WorkUnitType::Questions => "QUESTIONS",
            WorkUnitType::Review => "REVIEW",
        }
    }

    /// Prefix used in task titles
    pub fn title_prefix(&self) -> &'static str {
        match self {
            WorkUnitType::Study => "Study",
            WorkUnitType::Questions => "Questions",
            WorkUnitType::Review => "Review",
        }
    }
}

impl std::fmt::Display for WorkUnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An atomic piece of planned work before it has a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkUnit {
    pub course_id: String,
    #[serde(rename = "type")]
    pub unit_type: WorkUnitType,
    pub title: String,
    /// Always exactly one section
    pub section_ids: Vec<String>,
    pub topic_tags: Vec<String>,
    pub est_minutes: u32,
    pub difficulty: u8,
    pub source_order: i64,
    /// Days after the section's study day (REVIEW only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_offset_days: Option<u32>,
    /// Timing came from the memory model rather than the static policy
    #[serde(default)]
    pub adaptive: bool,
}

impl WorkUnit {
    pub fn section_id(&self) -> Option<&str> {
        self.section_ids.first().map(String::as_str)
    }

    pub fn is_review(&self) -> bool {
        self.unit_type == WorkUnitType::Review
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Expand sections into work units, in input order.
///
/// Per section: one STUDY unit; one QUESTIONS unit when questions are
/// complete; REVIEW units from the section's memory card when it carries a
/// schedule, otherwise from the revision policy table. `Off` suppresses every
/// REVIEW unit.
pub fn build_work_units(
    sections: &[Section],
    course_id: &str,
    policy: RevisionPolicy,
    memory_cards: &[MemoryCard],
    config: &PlannerConfig,
) -> Vec<WorkUnit> {
    let cards: HashMap<&str, &MemoryCard> = memory_cards
        .iter()
        .map(|card| (card.section_id.as_str(), card))
        .collect();
    let steps = config.revision_policies.steps(policy);

    let mut units = Vec::with_capacity(sections.len() * (2 + steps.len()));
    for (position, section) in sections.iter().enumerate() {
        let title = derive_title(section, position);
        let study_minutes = clamp_study_minutes(section.est_minutes);
        let difficulty = clamp_section_difficulty(section.difficulty);

        let unit = |unit_type: WorkUnitType, est_minutes: u32| WorkUnit {
            course_id: course_id.to_string(),
            unit_type,
            title: format!("{}: {}", unit_type.title_prefix(), title),
            section_ids: vec![section.id.clone()],
            topic_tags: section.topic_tags.clone(),
            est_minutes,
            difficulty,
            source_order: section.source_order,
            review_offset_days: None,
            adaptive: false,
        };

        units.push(unit(WorkUnitType::Study, study_minutes));

        if section.questions_status == QuestionsStatus::Completed {
            units.push(unit(WorkUnitType::Questions, questions_minutes(study_minutes)));
        }

        if policy == RevisionPolicy::Off {
            continue;
        }

        match cards.get(section.id.as_str()).filter(|card| card.has_schedule()) {
            Some(card) => units.push(WorkUnit {
                review_offset_days: Some(card.interval),
                adaptive: true,
                ..unit(WorkUnitType::Review, adaptive_review_minutes(card.difficulty))
            }),
            None => units.extend(steps.iter().map(|step| WorkUnit {
                review_offset_days: Some(step.offset_days),
                ..unit(WorkUnitType::Review, step.minutes)
            })),
        }
    }

    tracing::debug!(
        sections = sections.len(),
        units = units.len(),
        policy = policy.as_str(),
        "Built work units"
    );
    units
}

/// Total requested minutes across units
pub fn compute_total_load(units: &[WorkUnit]) -> u32 {
    units.iter().map(|unit| unit.est_minutes).sum()
}

fn clamp_study_minutes(raw: f64) -> u32 {
    if !raw.is_finite() {
        return MIN_STUDY_MINUTES;
    }
    raw.round()
        .clamp(f64::from(MIN_STUDY_MINUTES), f64::from(MAX_STUDY_MINUTES)) as u32
}

fn clamp_section_difficulty(raw: f64) -> u8 {
    if !raw.is_finite() {
        return MIN_SECTION_DIFFICULTY;
    }
    raw.round().clamp(
        f64::from(MIN_SECTION_DIFFICULTY),
        f64::from(MAX_SECTION_DIFFICULTY),
    ) as u8
}

/// `max(8, round(0.35 * study))`
pub fn questions_minutes(study_minutes: u32) -> u32 {
    ((f64::from(study_minutes) * QUESTIONS_TIME_RATIO).round() as u32).max(MIN_QUESTIONS_MINUTES)
}

// ============================================================================
// TESTS
// ============================================================================
