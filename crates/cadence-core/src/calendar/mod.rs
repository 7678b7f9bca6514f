//! Capacity Calendar
//!
//! Builds the day-by-day study budget for one scheduling run:
//! - Starts today, ends at the exam date (or the default study period)
//! - Never longer than the configured schedule window
//! - Skips excluded dates
//! - Withholds the catch-up buffer from every day
//!
//! The result is an owned [`DayCapacities`] value. Placement takes it by
//! value and hands back the post-run snapshot, so a day list is never shared
//! between runs.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::{Availability, PlannerConfig};

// ============================================================================
// DAY SLOT
// ============================================================================

/// One calendar day's study budget during a scheduling run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySlot {
    pub date: NaiveDate,
    /// Minutes available after the catch-up buffer
    pub usable_capacity: u32,
    /// Minutes not yet claimed by placed work (never above `usable_capacity`)
    pub remaining: u32,
}

impl DaySlot {
    /// A fresh slot with its full capacity remaining
    pub fn new(date: NaiveDate, usable_capacity: u32) -> Self {
        Self {
            date,
            usable_capacity,
            remaining: usable_capacity,
        }
    }

    /// Minutes already claimed
    pub fn used(&self) -> u32 {
        self.usable_capacity.saturating_sub(self.remaining)
    }

    pub fn has_room_for(&self, minutes: u32) -> bool {
        self.remaining >= minutes
    }

    /// Claim minutes, returning how many did not fit
    fn consume(&mut self, minutes: u32) -> u32 {
        let overflow = minutes.saturating_sub(self.remaining);
        self.remaining = self.remaining.saturating_sub(minutes);
        overflow
    }
}

// ============================================================================
// DAY CAPACITIES
// ============================================================================

/// Ordered, owned list of day slots for a single run. Serializes as a plain
/// array; deserializing goes through [`DayCapacities::new`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<DaySlot>", into = "Vec<DaySlot>")]
pub struct DayCapacities {
    slots: Vec<DaySlot>,
}

impl DayCapacities {
    /// Wrap caller-built slots. Slots are sorted by date and `remaining` is
    /// capped at `usable_capacity`.
    pub fn new(mut slots: Vec<DaySlot>) -> Self {
        for slot in &mut slots {
            slot.remaining = slot.remaining.min(slot.usable_capacity);
        }
        slots.sort_by_key(|slot| slot.date);
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[DaySlot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&DaySlot> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DaySlot> {
        self.slots.iter()
    }

    /// Sum of usable capacity across all days
    pub fn total_capacity(&self) -> u32 {
        self.slots.iter().map(|slot| slot.usable_capacity).sum()
    }

    /// Sum of unclaimed minutes across all days
    pub fn total_remaining(&self) -> u32 {
        self.slots.iter().map(|slot| slot.remaining).sum()
    }

    /// Largest single-day capacity (0 for an empty calendar)
    pub fn largest_capacity(&self) -> u32 {
        self.slots
            .iter()
            .map(|slot| slot.usable_capacity)
            .max()
            .unwrap_or(0)
    }

    /// Position of a date in the calendar
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.slots.binary_search_by_key(&date, |slot| slot.date).ok()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.slots.first().map(|slot| slot.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.slots.last().map(|slot| slot.date)
    }

    pub fn into_vec(self) -> Vec<DaySlot> {
        self.slots
    }

    /// Claim minutes on a day, returning the overflow that did not fit
    pub(crate) fn consume(&mut self, index: usize, minutes: u32) -> u32 {
        self.slots
            .get_mut(index)
            .map(|slot| slot.consume(minutes))
            .unwrap_or(minutes)
    }
}

impl From<Vec<DaySlot>> for DayCapacities {
    fn from(slots: Vec<DaySlot>) -> Self {
        Self::new(slots)
    }
}

impl From<DayCapacities> for Vec<DaySlot> {
    fn from(days: DayCapacities) -> Self {
        days.slots
    }
}

impl<'a> IntoIterator for &'a DayCapacities {
    type Item = &'a DaySlot;
    type IntoIter = std::slice::Iter<'a, DaySlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Build the capacity calendar for a run.
///
/// Covers `today` through `min(horizon, today + max_schedule_days - 1)`
/// inclusive, so the result never exceeds `max_schedule_days` entries. A
/// missing horizon means `today + default_study_period_days`; a horizon in
/// the past is treated as today.
pub fn build_day_capacities(
    today: NaiveDate,
    horizon: Option<NaiveDate>,
    availability: &Availability,
    config: &PlannerConfig,
) -> DayCapacities {
    let requested_end = horizon
        .or_else(|| today.checked_add_days(Days::new(u64::from(config.default_study_period_days))))
        .unwrap_or(today)
        .max(today);

    let window = u64::from(config.max_schedule_days.max(1));
    let hard_end = today
        .checked_add_days(Days::new(window - 1))
        .unwrap_or(NaiveDate::MAX);
    let end = requested_end.min(hard_end);

    let mut slots = Vec::new();
    let mut offset = 0u64;
    while let Some(date) = today.checked_add_days(Days::new(offset)) {
        if date > end {
            break;
        }
        offset += 1;
        if availability.is_excluded(date) {
            continue;
        }
        slots.push(DaySlot::new(date, availability.usable_minutes(date)));
    }

    tracing::debug!(
        days = slots.len(),
        start = %today,
        end = %end,
        "Built capacity calendar"
    );

    DayCapacities { slots }
}

// ============================================================================
// TESTS
// ============================================================================
