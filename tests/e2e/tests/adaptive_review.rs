//! Journey: completed reviews re-time the next review
//!
//! Exercises the review pipeline end to end through `TestStoreManager`:
//! status trigger, attempt grading, memory card update, next task emission
//! and persistence of the resulting state.

use cadence_core::{
    CardState, Grade, PlannerConfig, ReviewTarget, RevisionPolicy, StudyPlanner, TaskStatus,
    TaskStatusChange, WorkUnitType, adaptive_review_minutes,
};
use cadence_e2e_tests::{TestDataFactory, TestStoreManager};
use chrono::Duration;

const COURSE: &str = "course-e2e";

// ============================================================================
// FIRST REVIEW
// ============================================================================

#[test]
fn test_strong_attempts_grade_easy() {
    let mut env = TestStoreManager::new_temp();
    env.record_attempts("s1", 5, 0, 15.0, Some(4.5));

    let outcome = env.complete_review(COURSE, "s1").expect("review scheduled");
    assert_eq!(outcome.grade, Grade::Easy);
    assert_eq!(outcome.stats.count, 5);

    let card = &outcome.card;
    assert_eq!(card.state, CardState::Review);
    assert_eq!(card.reps, 1);
    assert!(card.interval >= 1);
    assert_eq!(card.last_review, Some(env.now()));
    assert_eq!(
        card.next_review,
        Some(env.now() + Duration::days(i64::from(card.interval)))
    );

    let task = &outcome.task;
    assert_eq!(task.task_type, WorkUnitType::Review);
    assert_eq!(task.status, TaskStatus::Todo);
    assert!(task.adaptive);
    assert_eq!(task.section_ids, vec!["s1".to_string()]);
    assert_eq!(task.due_at, env.now() + Duration::days(i64::from(card.interval)));
    assert_eq!(task.due_date, task.due_at.date_naive());
    assert_eq!(task.est_minutes, adaptive_review_minutes(card.difficulty));
    assert_eq!(task.title, "Review: s1");

    assert_eq!(env.card("s1"), Some(card));
    assert_eq!(env.store.review_tasks().len(), 1);
}

#[test]
fn test_unquizzed_section_grades_good() {
    let mut env = TestStoreManager::new_temp();
    let outcome = env.complete_review(COURSE, "s1").expect("review scheduled");
    assert_eq!(outcome.grade, Grade::Good);
    assert_eq!(outcome.stats.count, 0);
    assert_eq!(outcome.card.state, CardState::Review);
}

#[test]
fn test_weak_first_review_stays_learning() {
    let mut env = TestStoreManager::new_temp();
    env.record_attempts("s1", 1, 9, 45.0, Some(2.0));

    let outcome = env.complete_review(COURSE, "s1").expect("review scheduled");
    assert_eq!(outcome.grade, Grade::Again);
    assert_eq!(outcome.card.state, CardState::Learning);
    assert_eq!(outcome.card.reps, 0);
    assert_eq!(outcome.card.lapses, 0);
    assert!(outcome.card.interval >= 1);
}

// ============================================================================
// MULTI-REVIEW JOURNEYS
// ============================================================================

#[test]
fn test_successful_reviews_grow_intervals() {
    let mut env = TestStoreManager::new_temp();
    let mut previous = env.complete_review(COURSE, "s1").expect("first").card;

    for round in 2..=4u32 {
        env.advance_to_due("s1");
        let outcome = env.complete_review(COURSE, "s1").expect("review scheduled");
        assert_eq!(outcome.grade, Grade::Good);
        assert!(outcome.elapsed_days >= 1.0);

        let card = outcome.card;
        assert_eq!(card.reps, round);
        assert_eq!(card.state, CardState::Review);
        assert!(
            card.stability > previous.stability,
            "round {}: {} <= {}",
            round,
            card.stability,
            previous.stability
        );
        assert!(card.interval >= previous.interval);
        previous = card;
    }

    assert_eq!(env.store.review_tasks().len(), 4);
}

#[test]
fn test_poor_attempts_cause_lapse() {
    let mut env = TestStoreManager::new_temp();
    let learned = env.complete_review(COURSE, "s1").expect("first").card;

    env.advance_to_due("s1");
    env.record_attempts("s1", 1, 9, 50.0, Some(2.5));
    let outcome = env.complete_review(COURSE, "s1").expect("review scheduled");

    assert_eq!(outcome.grade, Grade::Again);
    assert_eq!(outcome.stats.count, 10);
    let card = outcome.card;
    assert_eq!(card.state, CardState::Relearning);
    assert_eq!(card.lapses, 1);
    assert_eq!(card.reps, learned.reps);
    assert!(card.stability <= learned.stability);
    assert!(card.interval >= 1);
}

#[test]
fn test_same_day_review_uses_short_term_stability() {
    let mut env = TestStoreManager::new_temp();
    let first = env.complete_review(COURSE, "s1").expect("first").card;

    env.advance_hours(3);
    let outcome = env.complete_review(COURSE, "s1").expect("second");
    assert!(outcome.elapsed_days < 1.0);
    assert_eq!(outcome.card.state, CardState::Review);
    assert!(outcome.card.stability > first.stability);
}

#[test]
fn test_min_interval_respected() {
    let config = PlannerConfig {
        review_target: ReviewTarget::new(0.9, 3, 60),
        ..Default::default()
    };
    let mut env = TestStoreManager::with_config(&config);
    env.record_attempts("s1", 0, 10, 90.0, Some(1.0));

    let outcome = env.complete_review(COURSE, "s1").expect("review scheduled");
    assert_eq!(outcome.grade, Grade::Again);
    assert_eq!(outcome.card.interval, 3);
}

#[test]
fn test_sections_are_independent() {
    let mut env = TestStoreManager::new_temp();
    env.record_attempts("s2", 0, 10, 90.0, None);

    let s1 = env.complete_review(COURSE, "s1").expect("s1");
    let s2 = env.complete_review(COURSE, "s2").expect("s2");
    assert_eq!(s1.grade, Grade::Good);
    assert_eq!(s2.grade, Grade::Again);
    assert_eq!(env.store.cards().count(), 2);
    assert_eq!(env.store.cards_for_course(COURSE).len(), 2);
}

// ============================================================================
// TRIGGER FILTERING
// ============================================================================

fn change(task_type: WorkUnitType, previous: TaskStatus, current: TaskStatus) -> TaskStatusChange {
    TaskStatusChange {
        task_id: "task-1".to_string(),
        course_id: COURSE.to_string(),
        task_type,
        title: String::new(),
        section_ids: vec!["s1".to_string()],
        previous,
        current,
        changed_at: TestDataFactory::today()
            .and_hms_opt(9, 0, 0)
            .expect("valid time")
            .and_utc(),
    }
}

#[test]
fn test_non_review_triggers_ignored() {
    let mut env = TestStoreManager::new_temp();
    let ignored = [
        change(WorkUnitType::Study, TaskStatus::Todo, TaskStatus::Done),
        change(WorkUnitType::Questions, TaskStatus::InProgress, TaskStatus::Done),
        change(WorkUnitType::Review, TaskStatus::Done, TaskStatus::Done),
        change(WorkUnitType::Review, TaskStatus::Todo, TaskStatus::InProgress),
        change(WorkUnitType::Review, TaskStatus::Done, TaskStatus::Todo),
        change(WorkUnitType::Review, TaskStatus::Todo, TaskStatus::Skipped),
    ];

    for event in &ignored {
        assert!(env.scheduler.on_task_updated(&mut env.store, event).is_none());
    }
    assert!(env.card("s1").is_none());
    assert!(env.store.review_tasks().is_empty());

    let fired = change(WorkUnitType::Review, TaskStatus::InProgress, TaskStatus::Done);
    let outcome = env
        .scheduler
        .on_task_updated(&mut env.store, &fired)
        .expect("review scheduled");
    assert_eq!(outcome.task.source_task_id, "task-1");
}

#[test]
fn test_review_without_section_is_swallowed() {
    let mut env = TestStoreManager::new_temp();
    let mut event = change(WorkUnitType::Review, TaskStatus::Todo, TaskStatus::Done);
    event.section_ids.clear();

    assert!(env.scheduler.on_task_updated(&mut env.store, &event).is_none());
    assert!(env.store.review_tasks().is_empty());
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_state_survives_reload() {
    let mut env = TestStoreManager::new_temp();
    env.record_attempts("s1", 4, 1, 25.0, Some(3.5));
    let before = env.complete_review(COURSE, "s1").expect("review").card;

    env.persist();
    assert!(env.path().exists());
    env.reload();

    let after = env.card("s1").expect("card reloaded");
    assert_eq!(after.state, before.state);
    assert_eq!(after.reps, before.reps);
    assert_eq!(after.interval, before.interval);
    assert_eq!(after.next_review, before.next_review);
    assert!((after.stability - before.stability).abs() < 1e-9);
    assert_eq!(env.store.attempts().len(), 5);
    assert_eq!(env.store.review_tasks().len(), 1);

    // next review continues from the reloaded card
    env.advance_to_due("s1");
    let next = env.complete_review(COURSE, "s1").expect("next review");
    assert_eq!(next.card.reps, before.reps + 1);
}

#[test]
fn test_snapshot_restore() {
    let mut env = TestStoreManager::new_temp();
    assert!(!env.restore_snapshot());

    let first = env.complete_review(COURSE, "s1").expect("first").card;
    env.take_snapshot();

    env.advance_to_due("s1");
    env.complete_review(COURSE, "s1").expect("second");
    assert_ne!(env.card("s1"), Some(&first));

    assert!(env.restore_snapshot());
    assert_eq!(env.card("s1"), Some(&first));
    assert_eq!(env.store.review_tasks().len(), 1);
}

// ============================================================================
// FEEDBACK INTO PLANNING
// ============================================================================

#[test]
fn test_replan_uses_memory_cards() {
    let mut env = TestStoreManager::new_temp();
    env.record_attempts("s1", 5, 0, 15.0, Some(5.0));
    let card = env.complete_review(COURSE, "s1").expect("review").card;

    let mut request = TestDataFactory::three_section_scenario().request;
    request.revision_policy = RevisionPolicy::Light;
    request.memory_cards = env.store.cards_for_course(COURSE);

    let outcome = StudyPlanner::default().plan(&request);
    let placement = outcome.placement().expect("scheduled");
    let reviews: Vec<_> = placement
        .tasks
        .iter()
        .filter(|t| t.unit.unit_type == WorkUnitType::Review)
        .collect();

    let adaptive: Vec<_> = reviews.iter().filter(|t| t.unit.adaptive).collect();
    assert_eq!(adaptive.len(), 1);
    assert_eq!(adaptive[0].unit.section_id(), Some("s1"));
    assert_eq!(adaptive[0].unit.review_offset_days, Some(card.interval));
    assert_eq!(adaptive[0].unit.est_minutes, adaptive_review_minutes(card.difficulty));

    // s2 and s3 keep the two light-policy steps each
    assert_eq!(reviews.len() - adaptive.len(), 4);
}
