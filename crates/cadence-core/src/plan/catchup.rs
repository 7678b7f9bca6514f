//! Catch-up redistribution
//!
//! Re-spreads overdue TODO tasks over the next few days. With a capacity
//! calendar the items are packed into real free time; without one they are
//! split evenly over a fixed span.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::DayCapacities;
use crate::config::{DEFAULT_CATCH_UP_MINUTES, DEFAULT_CATCH_UP_SPAN_DAYS, PlannerConfig};

/// Priority given to every redistributed task so it surfaces first
pub const CATCH_UP_PRIORITY: u8 = 1;

/// An overdue TODO task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueItem {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_minutes: Option<u32>,
}

impl OverdueItem {
    pub fn new(task_id: impl Into<String>, est_minutes: Option<u32>) -> Self {
        Self {
            task_id: task_id.into(),
            est_minutes,
        }
    }
}

/// New due date for an overdue task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedistributedTask {
    pub task_id: String,
    pub due_date: NaiveDate,
    /// Days after today
    pub day_offset: i64,
    pub priority: u8,
}

#[derive(Debug, Clone)]
pub struct CatchUpRedistributor {
    span_days: u32,
    default_minutes: u32,
}

impl Default for CatchUpRedistributor {
    fn default() -> Self {
        Self {
            span_days: DEFAULT_CATCH_UP_SPAN_DAYS,
            default_minutes: DEFAULT_CATCH_UP_MINUTES,
        }
    }
}

impl CatchUpRedistributor {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            span_days: config.catch_up_span_days,
            default_minutes: config.catch_up_default_minutes,
        }
    }

    pub fn with_span_days(mut self, span_days: u32) -> Self {
        self.span_days = span_days;
        self
    }

    /// Redistribute in input order. An empty or missing calendar falls back
    /// to the even split.
    pub fn redistribute(
        &self,
        items: &[OverdueItem],
        today: NaiveDate,
        capacities: Option<DayCapacities>,
    ) -> Vec<RedistributedTask> {
        let tasks = match capacities.filter(|days| !days.is_empty()) {
            Some(days) => self.capacity_aware(items, today, days),
            None => self.even_split(items, today),
        };
        tracing::info!(items = items.len(), "Redistributed overdue tasks");
        tasks
    }

    /// Pack into free time. The cursor never moves back; items that fit
    /// nowhere go on the last day.
    fn capacity_aware(
        &self,
        items: &[OverdueItem],
        today: NaiveDate,
        mut days: DayCapacities,
    ) -> Vec<RedistributedTask> {
        let last = days.len() - 1;
        let mut cursor = 0;
        let mut tasks = Vec::with_capacity(items.len());

        for item in items {
            let minutes = item.est_minutes.unwrap_or(self.default_minutes);
            let fit = (cursor..days.len())
                .find(|&i| days.get(i).is_some_and(|slot| slot.has_room_for(minutes)));
            let index = match fit {
                Some(index) => {
                    cursor = index;
                    index
                }
                None => {
                    tracing::debug!(
                        task_id = item.task_id.as_str(),
                        minutes,
                        "Piling onto last day"
                    );
                    last
                }
            };
            days.consume(index, minutes);

            let Some(slot) = days.get(index) else {
                continue;
            };
            tasks.push(RedistributedTask {
                task_id: item.task_id.clone(),
                due_date: slot.date,
                day_offset: (slot.date - today).num_days(),
                priority: CATCH_UP_PRIORITY,
            });
        }
        tasks
    }

    /// `ceil(n / span)` items per day starting tomorrow
    fn even_split(&self, items: &[OverdueItem], today: NaiveDate) -> Vec<RedistributedTask> {
        let span = self.span_days.max(1) as usize;
        let bucket = items.len().div_ceil(span).max(1);

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let offset = (i / bucket + 1) as u64;
                RedistributedTask {
                    task_id: item.task_id.clone(),
                    due_date: today.checked_add_days(Days::new(offset)).unwrap_or(today),
                    day_offset: offset as i64,
                    priority: CATCH_UP_PRIORITY,
                }
            })
            .collect()
    }
}

/// Redistribute with the default per-item estimate
pub fn distribute_overdue(
    items: &[OverdueItem],
    today: NaiveDate,
    span_days: u32,
    capacities: Option<DayCapacities>,
) -> Vec<RedistributedTask> {
    CatchUpRedistributor::default()
        .with_span_days(span_days)
        .redistribute(items, today, capacities)
}
