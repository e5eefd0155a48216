use chrono::NaiveDate;
use engine::config::{ObjectiveWeights, SchedulerConfig};
use engine::model::Worker;
use engine::{generate_schedule, EngineError};
use shared::WorkerId;
use std::collections::HashSet;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn config(start: NaiveDate, end: NaiveDate, workers: Vec<Worker>) -> SchedulerConfig {
    SchedulerConfig {
        start_date: start,
        end_date: end,
        num_shifts: 1,
        variable_shifts: Vec::new(),
        holidays: HashSet::new(),
        workers,
        min_gap_days: 2,
        weekend_window_days: 21,
        max_weekend_per_window: 3,
        max_displacement_depth: 3,
        max_candidate_dates: 5,
        objective_weights: ObjectiveWeights::default(),
        phase1_attempts: 6,
        max_improvement_loops: 10,
        seed: 2026,
    }
}

#[test]
fn small_pool_over_a_month_leaves_no_hard_violations() {
    let workers = vec![
        Worker::new("dr-acosta", 100.0),
        Worker::new("dr-blum", 100.0),
        Worker::new("dr-castillo", 75.0),
        Worker::new("dr-duarte", 50.0),
    ];
    let config = config(d(2026, 2, 1), d(2026, 2, 28), workers);

    let report = generate_schedule(&config, None).unwrap();

    assert!(report.violations.iter().all(|v| !v.is_hard()));
    assert!(
        report.schedule.total_unfilled() <= 2,
        "four workers across four weeks should cover nearly every single-slot day, left {}",
        report.schedule.total_unfilled()
    );
}

#[test]
fn mandatory_day_survives_both_phases() {
    let mut mandatory_worker = Worker::new("dr-acosta", 100.0);
    mandatory_worker.mandatory_days.insert(d(2026, 3, 15));
    let workers = vec![mandatory_worker, Worker::new("dr-blum", 100.0), Worker::new("dr-castillo", 100.0)];
    let config = config(d(2026, 3, 1), d(2026, 3, 31), workers);

    let report = generate_schedule(&config, None).unwrap();

    assert!(report.schedule.is_assigned(d(2026, 3, 15), &WorkerId::new("dr-acosta")));
}

#[test]
fn incompatible_pair_never_shares_a_day_even_under_pressure() {
    let mut a = Worker::new("dr-acosta", 100.0);
    a.incompatible_with.insert(WorkerId::new("dr-blum"));
    let mut config = config(d(2026, 4, 1), d(2026, 4, 30), vec![a, Worker::new("dr-blum", 100.0)]);
    config.num_shifts = 2;

    let report = generate_schedule(&config, None).unwrap();

    for date in config.dates() {
        let assigned = report.schedule.assigned_on(date);
        let has_both = assigned.contains(&&WorkerId::new("dr-acosta")) && assigned.contains(&&WorkerId::new("dr-blum"));
        assert!(!has_both, "incompatible pair must never co-occur on {date}");
    }
}

#[test]
fn days_off_are_never_assigned() {
    let mut worker = Worker::new("dr-acosta", 100.0);
    worker.days_off.push(engine::model::DateRange::new(d(2026, 5, 10), d(2026, 5, 20)));
    let config = config(d(2026, 5, 1), d(2026, 5, 31), vec![worker, Worker::new("dr-blum", 100.0)]);

    let report = generate_schedule(&config, None).unwrap();

    let off_range_end = d(2026, 5, 20);
    for date in d(2026, 5, 10).iter_days().take_while(|day| *day <= off_range_end) {
        assert!(!report.schedule.is_assigned(date, &WorkerId::new("dr-acosta")));
    }
}

#[test]
fn variable_shift_rule_changes_slot_count_for_its_window() {
    use engine::config::VariableShiftRule;
    use engine::model::DateRange;

    let mut config = config(
        d(2026, 6, 1),
        d(2026, 6, 30),
        vec![Worker::new("dr-acosta", 100.0), Worker::new("dr-blum", 100.0), Worker::new("dr-castillo", 100.0)],
    );
    config.variable_shifts.push(VariableShiftRule { range: DateRange::new(d(2026, 6, 15), d(2026, 6, 20)), count: 2 });

    let report = generate_schedule(&config, None).unwrap();

    assert_eq!(report.schedule.day(d(2026, 6, 16)).unwrap().len(), 2);
    assert_eq!(report.schedule.day(d(2026, 6, 1)).unwrap().len(), 1);
}

#[test]
fn empty_worker_pool_is_rejected_before_any_work_happens() {
    let config = config(d(2026, 1, 1), d(2026, 1, 31), Vec::new());
    assert!(matches!(generate_schedule(&config, None), Err(EngineError::Config(_))));
}

#[test]
fn incompatible_co_mandatory_is_surfaced_not_dropped() {
    let mut a = Worker::new("dr-acosta", 100.0);
    a.incompatible_with.insert(WorkerId::new("dr-blum"));
    a.mandatory_days.insert(d(2026, 1, 15));
    let mut b = Worker::new("dr-blum", 100.0);
    b.mandatory_days.insert(d(2026, 1, 15));
    let config = config(d(2026, 1, 1), d(2026, 1, 31), vec![a, b]);

    let report = generate_schedule(&config, None).unwrap();

    assert!(report.unresolved_mandatories.iter().any(|u| u.date == d(2026, 1, 15)));
    assert!(report.violations.iter().all(|v| !v.is_hard()));
}

#[test]
fn a_cancellation_token_set_before_the_call_returns_a_cancelled_draft() {
    use engine::cancellation::CancellationToken;

    let workers = vec![Worker::new("dr-acosta", 100.0), Worker::new("dr-blum", 100.0)];
    let config = config(d(2026, 8, 1), d(2026, 8, 31), workers);
    let token = CancellationToken::new();
    token.cancel();

    let report = generate_schedule(&config, Some(&token)).unwrap();

    assert!(report.cancelled);
    assert_eq!(report.schedule.total_assignments(&WorkerId::new("dr-acosta")), 0);
}

#[test]
fn rerunning_with_the_same_seed_is_reproducible() {
    let workers = vec![Worker::new("dr-acosta", 100.0), Worker::new("dr-blum", 100.0), Worker::new("dr-castillo", 100.0)];
    let config = config(d(2026, 7, 1), d(2026, 7, 31), workers);

    let first = generate_schedule(&config, None).unwrap();
    let second = generate_schedule(&config, None).unwrap();

    for date in config.dates() {
        assert_eq!(first.schedule.assigned_on(date), second.schedule.assigned_on(date));
    }
}
