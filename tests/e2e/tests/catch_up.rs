//! Journey: overdue tasks are spread over the coming days

use std::collections::BTreeMap;

use cadence_core::{
    AvailabilityConfig, CatchUpRedistributor, DayCapacities, OverdueItem, PlannerConfig,
    RedistributedTask, build_day_capacities, distribute_overdue,
};
use cadence_e2e_tests::TestDataFactory;

fn per_offset(tasks: &[RedistributedTask]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for task in tasks {
        *counts.entry(task.day_offset).or_insert(0) += 1;
    }
    counts
}

// ============================================================================
// EVEN SPLIT
// ============================================================================

#[test]
fn test_even_split_stays_in_window() {
    let today = TestDataFactory::today();
    let items = TestDataFactory::overdue_items(12, None);
    let tasks = distribute_overdue(&items, today, 5, None);

    assert_eq!(tasks.len(), 12);
    for (task, item) in tasks.iter().zip(&items) {
        assert_eq!(task.task_id, item.task_id);
        assert!((1..=5).contains(&task.day_offset));
        assert_eq!(task.due_date, TestDataFactory::day(task.day_offset as u64));
        assert_eq!(task.priority, 1);
    }

    // ceil(12 / 5) = 3 per day, in input order
    let offsets: Vec<_> = tasks.iter().map(|t| t.day_offset).collect();
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
    assert!(per_offset(&tasks).values().all(|&n| n <= 3));
}

#[test]
fn test_few_items_one_per_day() {
    let tasks = distribute_overdue(
        &TestDataFactory::overdue_items(3, Some(20)),
        TestDataFactory::today(),
        5,
        None,
    );
    let offsets: Vec<_> = tasks.iter().map(|t| t.day_offset).collect();
    assert_eq!(offsets, vec![1, 2, 3]);
}

#[test]
fn test_evenly_divisible_load() {
    let tasks = distribute_overdue(
        &TestDataFactory::overdue_items(10, None),
        TestDataFactory::today(),
        5,
        None,
    );
    let counts = per_offset(&tasks);
    assert_eq!(counts.len(), 5);
    assert!(counts.values().all(|&n| n == 2));
}

#[test]
fn test_nothing_overdue() {
    assert!(distribute_overdue(&[], TestDataFactory::today(), 5, None).is_empty());
    let days = TestDataFactory::upcoming_days(&[60, 60]);
    assert!(distribute_overdue(&[], TestDataFactory::today(), 5, Some(days)).is_empty());
}

#[test]
fn test_configured_span() {
    let config = PlannerConfig {
        catch_up_span_days: 2,
        ..Default::default()
    };
    let tasks = CatchUpRedistributor::new(&config).redistribute(
        &TestDataFactory::overdue_items(7, None),
        TestDataFactory::today(),
        None,
    );
    assert!(tasks.iter().all(|t| t.day_offset == 1 || t.day_offset == 2));
    assert_eq!(per_offset(&tasks)[&1], 4);
}

// ============================================================================
// CAPACITY AWARE
// ============================================================================

#[test]
fn test_capacity_aware_packing() {
    let days = TestDataFactory::upcoming_days(&[60, 30, 0, 90]);
    let items = TestDataFactory::overdue_items(4, Some(40));
    let tasks = distribute_overdue(&items, TestDataFactory::today(), 5, Some(days));

    let offsets: Vec<_> = tasks.iter().map(|t| t.day_offset).collect();
    // 40 fits day 1, then only day 4 has room; the last item piles on day 4
    assert_eq!(offsets, vec![1, 4, 4, 4]);
}

#[test]
fn test_capacity_aware_uses_default_estimate() {
    let days = TestDataFactory::upcoming_days(&[60, 60, 60]);
    let items = TestDataFactory::overdue_items(5, None);
    let tasks = CatchUpRedistributor::default().redistribute(
        &items,
        TestDataFactory::today(),
        Some(days),
    );

    // 30 minutes each, two per day
    let offsets: Vec<_> = tasks.iter().map(|t| t.day_offset).collect();
    assert_eq!(offsets, vec![1, 1, 2, 2, 3]);
}

#[test]
fn test_capacity_aware_cursor_never_retreats() {
    let days = TestDataFactory::upcoming_days(&[30, 90]);
    let items = vec![
        OverdueItem::new("long", Some(80)),
        OverdueItem::new("short", Some(10)),
    ];
    let tasks = distribute_overdue(&items, TestDataFactory::today(), 5, Some(days));

    // day 1 still has room for "short", but the cursor already moved on
    assert_eq!(tasks[0].day_offset, 2);
    assert_eq!(tasks[1].day_offset, 2);
}

#[test]
fn test_empty_calendar_falls_back_to_even_split() {
    let tasks = distribute_overdue(
        &TestDataFactory::overdue_items(4, None),
        TestDataFactory::today(),
        2,
        Some(DayCapacities::new(Vec::new())),
    );
    let offsets: Vec<_> = tasks.iter().map(|t| t.day_offset).collect();
    assert_eq!(offsets, vec![1, 1, 2, 2]);
}

#[test]
fn test_catch_up_against_real_calendar() {
    let today = TestDataFactory::today();
    let config = PlannerConfig::default();
    let mut raw = AvailabilityConfig::uniform(45);
    raw.excluded_dates = vec![TestDataFactory::day(2).to_string()];
    let days = build_day_capacities(
        TestDataFactory::day(1),
        Some(TestDataFactory::day(5)),
        &raw.sanitize(&config),
        &config,
    );
    assert_eq!(days.len(), 4);

    let items = TestDataFactory::overdue_items(6, Some(20));
    let tasks = distribute_overdue(&items, today, 5, Some(days));
    assert!(tasks.iter().all(|t| t.due_date != TestDataFactory::day(2)));
    let counts = per_offset(&tasks);
    assert_eq!(counts[&1], 2);
    assert_eq!(counts[&3], 2);
    assert_eq!(counts[&4], 2);
}
