//! Property-Based Tests for the scheduling engine
//!
//! Tests the following invariants:
//! - Calendar: never longer than the scheduling window, every day in range
//! - Determinism: identical inputs give identical plans
//! - Feasibility: feasible iff requested <= capacity, exact deficit
//! - Placement: drop policy never exceeds a day; minutes are conserved
//! - Memory model: Again never raises stability, intervals stay bounded and
//!   grow with stability
//! - Catch-up: offsets stay inside the span
//! - Grading: a better accuracy never yields a worse grade

use proptest::prelude::*;

use cadence_core::fsrs::bounded_interval_days;
use cadence_core::plan::{derive_title, is_generic_title};
use cadence_core::{
    AvailabilityConfig, CardState, DayCapacities, DaySlot, Grade, MemoryCard, MemoryScheduler,
    OverflowPolicy, PlannerConfig, ReviewTarget, RevisionPolicy, Section, StudyPlanner, TaskPlacer,
    build_day_capacities, build_work_units, check_feasibility, compute_total_load,
    distribute_overdue, grade_from_performance,
};
use cadence_e2e_tests::TestDataFactory;
use chrono::{Duration, TimeZone, Utc};

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_policy() -> impl Strategy<Value = RevisionPolicy> {
    prop_oneof![
        Just(RevisionPolicy::Off),
        Just(RevisionPolicy::Light),
        Just(RevisionPolicy::Standard),
        Just(RevisionPolicy::Aggressive),
    ]
}

fn arb_grade() -> impl Strategy<Value = Grade> {
    prop_oneof![
        Just(Grade::Again),
        Just(Grade::Hard),
        Just(Grade::Good),
        Just(Grade::Easy),
    ]
}

fn arb_availability() -> impl Strategy<Value = AvailabilityConfig> {
    (
        -100i64..1000,                                            // default minutes
        proptest::collection::btree_map(0u8..7, -50i64..900, 0..4), // weekday overrides
        proptest::collection::vec(0u64..60, 0..8),                // excluded day offsets
        -20.0f64..90.0,                                           // buffer percent
    )
        .prop_map(|(default_minutes, overrides, excluded, buffer)| AvailabilityConfig {
            default_minutes_per_day: default_minutes,
            per_day_overrides: overrides
                .into_iter()
                .map(|(day, minutes)| (day.to_string(), minutes))
                .collect(),
            excluded_dates: excluded
                .into_iter()
                .map(|offset| TestDataFactory::day(offset).to_string())
                .collect(),
            catch_up_buffer_percent: buffer,
        })
}

fn arb_sections() -> impl Strategy<Value = Vec<Section>> {
    proptest::collection::vec((1.0f64..300.0, 0.0f64..7.0), 1..15).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (minutes, difficulty))| {
                TestDataFactory::section(
                    &format!("s{}", i),
                    &format!("Topic {}", i),
                    minutes,
                    difficulty,
                    i as i64,
                )
            })
            .collect()
    })
}

fn arb_days() -> impl Strategy<Value = DayCapacities> {
    proptest::collection::vec(0u32..300, 1..20).prop_map(|capacities| {
        DayCapacities::new(
            capacities
                .into_iter()
                .enumerate()
                .map(|(i, minutes)| DaySlot::new(TestDataFactory::day(i as u64), minutes))
                .collect(),
        )
    })
}

fn arb_reviewed_card() -> impl Strategy<Value = MemoryCard> {
    (
        0.1f64..5000.0, // stability
        1.0f64..10.0,   // difficulty
        prop_oneof![
            Just(CardState::Learning),
            Just(CardState::Review),
            Just(CardState::Relearning),
        ],
    )
        .prop_map(|(stability, difficulty, state)| MemoryCard {
            state,
            stability,
            difficulty,
            reps: 3,
            ..MemoryCard::new("s1", "course-e2e")
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// PBT-1: the calendar is deterministic, stays inside the scheduling
    /// window, and no day exceeds the buffered maximum
    #[test]
    fn calendar_respects_window(
        availability in arb_availability(),
        horizon_days in 0u64..600,
        window in 1u32..400,
    ) {
        let config = PlannerConfig { max_schedule_days: window, ..Default::default() };
        let today = TestDataFactory::today();
        let horizon = TestDataFactory::day(horizon_days);
        let sanitized = availability.sanitize(&config);
        let days = build_day_capacities(today, Some(horizon), &sanitized, &config);
        let ceiling = f64::from(config.max_daily_minutes) * (1.0 - sanitized.buffer_fraction());

        prop_assert!(days.len() <= window as usize);
        prop_assert_eq!(&days, &build_day_capacities(today, Some(horizon), &sanitized, &config));
        let dates: Vec<_> = days.iter().map(|d| d.date).collect();
        prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        for slot in &days {
            prop_assert!(slot.date >= today && slot.date <= horizon);
            prop_assert!(f64::from(slot.usable_capacity) <= ceiling + 1e-6);
            prop_assert_eq!(slot.remaining, slot.usable_capacity);
        }
    }

    /// PBT-2: planning is a pure function of its inputs
    #[test]
    fn plan_is_deterministic(
        sections in arb_sections(),
        policy in arb_policy(),
        per_day in 15i64..240,
        span in 1u64..40,
    ) {
        let mut request = TestDataFactory::plan_request(sections, per_day, span);
        request.revision_policy = policy;
        let planner = StudyPlanner::default();

        let first = serde_json::to_value(planner.plan(&request)).unwrap();
        let second = serde_json::to_value(planner.plan(&request)).unwrap();
        prop_assert_eq!(first, second);
    }

    /// PBT-3: feasible iff requested <= capacity, with the exact deficit
    #[test]
    fn feasibility_matches_capacity(total in 0u32..10_000, days in arb_days()) {
        let report = check_feasibility(total, &days);
        let capacity = days.total_capacity();

        prop_assert_eq!(report.capacity_minutes, capacity);
        prop_assert_eq!(report.feasible, total <= capacity);
        prop_assert_eq!(report.deficit_minutes, total.saturating_sub(capacity));
        prop_assert_eq!(report.suggestions.is_empty(), report.feasible);
    }

    /// PBT-4: with the drop policy no day goes over capacity, and every
    /// minute is either placed or dropped
    #[test]
    fn drop_policy_never_overfills(
        sections in arb_sections(),
        policy in arb_policy(),
        days in arb_days(),
    ) {
        let config = PlannerConfig::default();
        let units = build_work_units(&sections, "course-e2e", policy, &[], &config);
        let total = compute_total_load(&units);
        let placement = TaskPlacer::new(&config)
            .with_overflow(OverflowPolicy::Drop)
            .place(units, days.clone());

        prop_assert_eq!(placement.forced_placements, 0);
        let totals = placement.minutes_by_day();
        for slot in &days {
            let used = totals.get(&slot.date).copied().unwrap_or(0);
            prop_assert!(used <= slot.usable_capacity, "{} used {} of {}", slot.date, used, slot.usable_capacity);
        }
        let dropped: u32 = placement.dropped.iter().map(|d| d.unit.est_minutes).sum();
        prop_assert_eq!(placement.placed_minutes() + dropped, total);
    }

    /// PBT-5: force placement only exceeds a day when it says so
    #[test]
    fn force_place_reports_overflow(
        sections in arb_sections(),
        policy in arb_policy(),
        days in arb_days(),
    ) {
        let config = PlannerConfig::default();
        let units = build_work_units(&sections, "course-e2e", policy, &[], &config);
        let total = compute_total_load(&units);
        let placement = TaskPlacer::new(&config).place(units, days.clone());

        let totals = placement.minutes_by_day();
        let over = days
            .iter()
            .filter(|slot| totals.get(&slot.date).copied().unwrap_or(0) > slot.usable_capacity)
            .count();
        if placement.forced_placements == 0 {
            prop_assert_eq!(over, 0);
        }
        let dropped: u32 = placement.dropped.iter().map(|d| d.unit.est_minutes).sum();
        prop_assert_eq!(placement.placed_minutes() + dropped, total);
        for task in &placement.tasks {
            prop_assert!(days.index_of(task.due_date).is_some());
        }
    }

    /// PBT-6: Again never raises the stability of a reviewed card
    #[test]
    fn again_never_raises_stability(card in arb_reviewed_card(), elapsed in 0.0f64..400.0) {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let next = MemoryScheduler::default().review_card(
            &card,
            Grade::Again,
            elapsed,
            &ReviewTarget::default(),
            now,
        );
        prop_assert!(next.stability <= card.stability);
        prop_assert!(next.stability > 0.0);
    }

    /// PBT-7: every review lands inside the interval bounds, and
    /// next_review = now + interval
    #[test]
    fn intervals_stay_bounded(
        card in arb_reviewed_card(),
        grade in arb_grade(),
        elapsed in 0.0f64..400.0,
        min in 1u32..10,
        extra in 0u32..400,
        retention in 0.7f64..0.99,
    ) {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap();
        let target = ReviewTarget::new(retention, min, min + extra);
        let next = MemoryScheduler::default().review_card(&card, grade, elapsed, &target, now);

        prop_assert!(next.interval >= min && next.interval <= min + extra);
        prop_assert_eq!(next.next_review, Some(now + Duration::days(i64::from(next.interval))));
        prop_assert_eq!(next.last_review, Some(now));
    }

    /// PBT-8: the interval is non-decreasing in stability
    #[test]
    fn interval_monotonic_in_stability(
        a in 0.01f64..40_000.0,
        b in 0.01f64..40_000.0,
        retention in 0.7f64..0.99,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            bounded_interval_days(low, retention, 1, 36_500)
                <= bounded_interval_days(high, retention, 1, 36_500)
        );
    }

    /// PBT-9: catch-up offsets are always within [1, span]
    #[test]
    fn catch_up_offsets_in_span(count in 0usize..200, span in 1u32..15) {
        let items = TestDataFactory::overdue_items(count, None);
        let tasks = distribute_overdue(&items, TestDataFactory::today(), span, None);

        prop_assert_eq!(tasks.len(), count);
        let bucket = count.div_ceil(span as usize).max(1);
        let mut per_day = std::collections::BTreeMap::new();
        for task in &tasks {
            prop_assert!(task.day_offset >= 1 && task.day_offset <= i64::from(span));
            *per_day.entry(task.day_offset).or_insert(0usize) += 1;
        }
        prop_assert!(per_day.values().all(|&n| n <= bucket));
    }

    /// PBT-10: raising accuracy never lowers the grade
    #[test]
    fn grade_monotonic_in_accuracy(
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
        time in 0.0f64..200.0,
        confidence in 0.0f64..=5.0,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            grade_from_performance(low, time, confidence)
                <= grade_from_performance(high, time, confidence)
        );
    }

    /// PBT-11: synthesized titles are never generic
    #[test]
    fn derived_titles_are_descriptive(
        concepts in proptest::collection::vec("[A-Za-z]{3,12}( [A-Za-z]{3,12})?", 0..5),
        position in 0usize..50,
    ) {
        let mut section = TestDataFactory::untitled_section("s1", 0, &[]);
        section.key_concepts = concepts;
        let title = derive_title(&section, position);
        prop_assert!(!title.trim().is_empty());
        if !title.starts_with("Section ") {
            prop_assert!(!is_generic_title(&title));
        }
    }
}
