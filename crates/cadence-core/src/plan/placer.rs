//! Task placement
//!
//! Single bin-packing pass assigning every work unit a day and an intra-day
//! order:
//! - STUDY and QUESTIONS units go first, in course order (harder first on ties)
//! - A unit bigger than the largest day is split into "(Part N)" chunks
//! - Chunks take the first day from the cursor with enough room
//! - REVIEW units anchor at their section's study day plus the offset
//!
//! The day list is owned by the run. It goes in by value and comes back in
//! [`Placement::days`] as the post-run snapshot.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::units::{WorkUnit, WorkUnitType};
use crate::calendar::DayCapacities;
use crate::config::PlannerConfig;

// ============================================================================
// TYPES
// ============================================================================

/// What to do with a chunk that fits on no day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Put it on the day with the most remaining time, even if that exceeds
    /// the day's capacity. Only when every day is full is it dropped.
    #[default]
    ForcePlace,
    /// Drop it
    Drop,
}

/// A work unit with a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedTask {
    #[serde(flatten)]
    pub unit: WorkUnit,
    pub due_date: NaiveDate,
    /// Position within the day, starting at 0
    pub order_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DropReason {
    /// No day had room under the active overflow policy
    NoCapacity,
    /// REVIEW unit whose section has no placed STUDY task
    MissingStudyTask,
    /// The calendar has no days
    EmptyCalendar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedUnit {
    pub unit: WorkUnit,
    pub reason: DropReason,
}

/// Result of one placement pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// Sorted by due date, then order index
    pub tasks: Vec<PlacedTask>,
    /// Day list after placement
    pub days: DayCapacities,
    pub dropped: Vec<DroppedUnit>,
    /// Placements that went over a day's remaining capacity
    pub forced_placements: u32,
}

impl Placement {
    /// Planned minutes per date
    pub fn minutes_by_day(&self) -> BTreeMap<NaiveDate, u32> {
        let mut totals = BTreeMap::new();
        for task in &self.tasks {
            *totals.entry(task.due_date).or_insert(0) += task.unit.est_minutes;
        }
        totals
    }

    pub fn placed_minutes(&self) -> u32 {
        self.tasks.iter().map(|task| task.unit.est_minutes).sum()
    }
}

// ============================================================================
// PLACER
// ============================================================================

#[derive(Debug, Clone)]
pub struct TaskPlacer {
    min_daily_minutes: u32,
    overflow: OverflowPolicy,
}

impl TaskPlacer {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            min_daily_minutes: config.min_daily_minutes,
            overflow: OverflowPolicy::default(),
        }
    }

    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn overflow(&self) -> OverflowPolicy {
        self.overflow
    }

    pub fn place(&self, units: Vec<WorkUnit>, days: DayCapacities) -> Placement {
        let mut run = Run {
            placer: self,
            order: vec![0; days.len()],
            days,
            cursor: 0,
            tasks: Vec::with_capacity(units.len()),
            dropped: Vec::new(),
            forced: 0,
        };

        if run.days.is_empty() {
            tracing::debug!(units = units.len(), "Empty calendar, nothing placed");
            run.dropped = units
                .into_iter()
                .map(|unit| DroppedUnit {
                    unit,
                    reason: DropReason::EmptyCalendar,
                })
                .collect();
            return run.finish();
        }

        let (mut work, reviews): (Vec<_>, Vec<_>) =
            units.into_iter().partition(|unit| !unit.is_review());
        work.sort_by(|a, b| {
            a.source_order
                .cmp(&b.source_order)
                .then(b.difficulty.cmp(&a.difficulty))
        });

        let mut study_day: HashMap<String, usize> = HashMap::new();
        for unit in work {
            for chunk in run.split(unit) {
                let Some(index) = run.place_chunk(chunk) else {
                    continue;
                };
                let Some(task) = run.tasks.last() else {
                    continue;
                };
                if task.unit.unit_type != WorkUnitType::Study {
                    continue;
                }
                if let Some(section_id) = task.unit.section_id() {
                    let day = study_day.entry(section_id.to_string()).or_insert(index);
                    *day = (*day).max(index);
                }
            }
        }

        for unit in reviews {
            let anchor = unit.section_id().and_then(|id| study_day.get(id)).copied();
            match anchor {
                Some(day) => run.place_review(unit, day),
                None => {
                    tracing::debug!(title = unit.title.as_str(), "Review without study task");
                    run.dropped.push(DroppedUnit {
                        unit,
                        reason: DropReason::MissingStudyTask,
                    });
                }
            }
        }

        run.finish()
    }
}

/// Place units with the default force-place overflow policy
pub fn place_tasks(units: Vec<WorkUnit>, days: DayCapacities, config: &PlannerConfig) -> Placement {
    TaskPlacer::new(config).place(units, days)
}

// ============================================================================
// RUN STATE
// ============================================================================

struct Run<'a> {
    placer: &'a TaskPlacer,
    days: DayCapacities,
    /// Next order index per day
    order: Vec<u32>,
    cursor: usize,
    tasks: Vec<PlacedTask>,
    dropped: Vec<DroppedUnit>,
    forced: u32,
}

impl Run<'_> {
    fn remaining(&self, index: usize) -> u32 {
        self.days.get(index).map_or(0, |slot| slot.remaining)
    }

    /// Split a unit larger than the largest day into capacity-sized parts
    fn split(&self, unit: WorkUnit) -> Vec<WorkUnit> {
        let largest = self.days.largest_capacity();
        if largest == 0 || unit.est_minutes <= largest {
            return vec![unit];
        }

        let parts = unit.est_minutes.div_ceil(largest);
        tracing::debug!(
            title = unit.title.as_str(),
            minutes = unit.est_minutes,
            parts,
            "Splitting oversized unit"
        );
        let mut left = unit.est_minutes;
        (1..=parts)
            .map(|part| {
                let minutes = left.min(largest);
                left -= minutes;
                WorkUnit {
                    title: format!("{} (Part {})", unit.title, part),
                    est_minutes: minutes,
                    ..unit.clone()
                }
            })
            .collect()
    }

    /// First fit from the cursor, then the overflow policy. Returns the day
    /// index the chunk landed on.
    fn place_chunk(&mut self, chunk: WorkUnit) -> Option<usize> {
        let minutes = chunk.est_minutes;
        let fit = (self.cursor..self.days.len()).find(|&i| self.remaining(i) >= minutes);

        let target = fit.or_else(|| match self.placer.overflow {
            OverflowPolicy::ForcePlace => (self.cursor..self.days.len())
                .filter(|&i| self.remaining(i) > 0)
                .fold(None, |best: Option<usize>, i| match best {
                    Some(b) if self.remaining(b) >= self.remaining(i) => Some(b),
                    _ => Some(i),
                }),
            OverflowPolicy::Drop => None,
        });

        let Some(index) = target else {
            tracing::debug!(title = chunk.title.as_str(), minutes, "No capacity, dropping");
            self.dropped.push(DroppedUnit {
                unit: chunk,
                reason: DropReason::NoCapacity,
            });
            return None;
        };

        self.assign(chunk, index);
        while self.cursor + 1 < self.days.len()
            && self.remaining(self.cursor) < self.placer.min_daily_minutes
        {
            self.cursor += 1;
        }
        Some(index)
    }

    fn place_review(&mut self, unit: WorkUnit, study_day: usize) {
        let last = self.days.len() - 1;
        let offset = unit.review_offset_days.unwrap_or(0) as usize;
        let target = study_day.saturating_add(offset).min(last);
        let minutes = unit.est_minutes;

        let fit = (target..=last).find(|&i| self.remaining(i) >= minutes);
        let index = match (fit, self.placer.overflow) {
            (Some(index), _) => index,
            (None, OverflowPolicy::ForcePlace) => last,
            (None, OverflowPolicy::Drop) => {
                tracing::debug!(title = unit.title.as_str(), minutes, "No room for review");
                self.dropped.push(DroppedUnit {
                    unit,
                    reason: DropReason::NoCapacity,
                });
                return;
            }
        };
        self.assign(unit, index);
    }

    fn assign(&mut self, unit: WorkUnit, index: usize) {
        let overflow = self.days.consume(index, unit.est_minutes);
        let Some(slot) = self.days.get(index) else {
            return;
        };
        if overflow > 0 {
            self.forced += 1;
            tracing::debug!(
                title = unit.title.as_str(),
                date = %slot.date,
                overflow,
                "Forced placement over capacity"
            );
        }
        let due_date = slot.date;
        let order_index = self.order[index];
        self.order[index] += 1;
        self.tasks.push(PlacedTask {
            unit,
            due_date,
            order_index,
        });
    }

    fn finish(mut self) -> Placement {
        self.tasks
            .sort_by(|a, b| (a.due_date, a.order_index).cmp(&(b.due_date, b.order_index)));
        tracing::info!(
            placed = self.tasks.len(),
            dropped = self.dropped.len(),
            forced = self.forced,
            "Placement finished"
        );
        Placement {
            tasks: self.tasks,
            days: self.days,
            dropped: self.dropped,
            forced_placements: self.forced,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
