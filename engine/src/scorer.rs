use chrono::NaiveDate;
use shared::WorkerId;
use std::collections::HashMap;

use crate::config::SchedulerConfig;
use crate::model::{calendar, Schedule, Worker};

/// Gaps forbidden between two assignments of the same worker on the same
/// weekday — exactly 7 and 14 days, never a configurable threshold.
pub const FORBIDDEN_SAME_WEEKDAY_GAPS: [i64; 2] = [7, 14];

/// Reason a candidate cannot take a slot. Every variant corresponds to a
/// hard constraint from spec §4.3 — none of these may ever be relaxed,
/// in either phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Unavailable,
    DayOff,
    OutsideWorkPeriod,
    AlreadyAssignedThatDay,
    Incompatible,
    MinGapViolated,
    WeeklyPatternViolated,
    WeekendCapExceeded,
    TargetReached,
}

impl Rejection {
    /// Short human-readable reason, used when a rejection is surfaced to a
    /// caller (e.g. an unresolved mandatory day) rather than just dropped.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Unavailable => "worker excluded from scheduling",
            Rejection::DayOff => "worker has a declared day off",
            Rejection::OutsideWorkPeriod => "outside any declared work period",
            Rejection::AlreadyAssignedThatDay => "worker already assigned that day",
            Rejection::Incompatible => "incompatible co-mandatory",
            Rejection::MinGapViolated => "minimum gap to an adjacent assignment violated",
            Rejection::WeeklyPatternViolated => "7/14-day same-weekday gap violated",
            Rejection::WeekendCapExceeded => "weekend-cap window exceeded",
            Rejection::TargetReached => "worker's target already reached",
        }
    }
}

/// Whether `worker` may legally take a slot on `date` given the schedule
/// built so far. This is the single source of truth for hard constraints;
/// both phases must route every prospective assignment through it.
pub fn can_assign(
    worker: &Worker,
    date: NaiveDate,
    schedule: &Schedule,
    config: &SchedulerConfig,
    targets: &HashMap<WorkerId, u32>,
    enforce_target: bool,
) -> Result<(), Rejection> {
    if worker.is_excluded() {
        return Err(Rejection::Unavailable);
    }
    if worker.is_day_off(date) {
        return Err(Rejection::DayOff);
    }
    if !worker.is_within_work_periods(date) {
        return Err(Rejection::OutsideWorkPeriod);
    }
    if schedule.is_assigned(date, &worker.id) {
        return Err(Rejection::AlreadyAssignedThatDay);
    }

    for other_id in schedule.assigned_on(date) {
        let mutually_incompatible = worker.incompatible_with.contains(other_id)
            || (worker.is_incompatible && is_incompatible_flagged(other_id, config));
        if mutually_incompatible {
            return Err(Rejection::Incompatible);
        }
    }

    let dates = schedule.assignments_for(&worker.id);
    let is_mandatory = worker.is_mandatory(date);
    if !is_mandatory {
        for &existing in dates {
            let gap = (date - existing).num_days().abs();
            if gap < config.min_gap_days {
                return Err(Rejection::MinGapViolated);
            }
            if FORBIDDEN_SAME_WEEKDAY_GAPS.contains(&gap) {
                return Err(Rejection::WeeklyPatternViolated);
            }
        }
    }

    if calendar::is_weekend_like(date, &config.holidays) {
        let window_start = calendar::weekend_start(date, &config.holidays);
        let window_end = window_start + chrono::Duration::days(config.weekend_window_days - 1);
        let count = dates
            .iter()
            .filter(|d| calendar::is_weekend_like(**d, &config.holidays))
            .filter(|d| **d >= window_start && **d <= window_end)
            .count() as u32;
        if count >= config.max_weekend_per_window {
            return Err(Rejection::WeekendCapExceeded);
        }
    }

    if enforce_target {
        if let Some(&target) = targets.get(&worker.id) {
            if schedule.total_assignments(&worker.id) as u32 >= target && !worker.is_mandatory(date) {
                return Err(Rejection::TargetReached);
            }
        }
    }

    Ok(())
}

fn is_incompatible_flagged(worker_id: &WorkerId, config: &SchedulerConfig) -> bool {
    config.workers.iter().any(|w| &w.id == worker_id && w.is_incompatible)
}

/// Ranks a feasible candidate for a slot: lower is preferred. Combines
/// under-fulfillment of target (so workers behind quota are favored) with
/// a small tie-breaking nudge away from recent and weekend-heavy load.
/// See spec §4.3 "scoring" and §4.4's reuse of the same shape for repairs.
pub fn score(
    worker: &Worker,
    date: NaiveDate,
    schedule: &Schedule,
    config: &SchedulerConfig,
    targets: &HashMap<WorkerId, u32>,
) -> f64 {
    let target = *targets.get(&worker.id).unwrap_or(&0) as f64;
    let assigned = schedule.total_assignments(&worker.id) as f64;
    let deficit = target - assigned;

    let weekend_bonus = if calendar::is_weekend_like(date, &config.holidays) {
        let weekend_count = schedule
            .assignments_for(&worker.id)
            .iter()
            .filter(|d| calendar::is_weekend_like(**d, &config.holidays))
            .count() as f64;
        weekend_count * config.objective_weights.beta
    } else {
        0.0
    };

    let recency_penalty = schedule
        .assignments_for(&worker.id)
        .last()
        .map(|&last| {
            let gap = (date - last).num_days() as f64;
            if gap <= 0.0 {
                f64::INFINITY
            } else {
                1.0 / gap
            }
        })
        .unwrap_or(0.0);

    -deficit * config.objective_weights.alpha + weekend_bonus + recency_penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObjectiveWeights;
    use std::collections::HashSet;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            start_date: d(2026, 1, 1),
            end_date: d(2026, 1, 31),
            num_shifts: 1,
            variable_shifts: Vec::new(),
            holidays: HashSet::new(),
            workers: vec![Worker::new("a", 100.0)],
            min_gap_days: 2,
            weekend_window_days: 21,
            max_weekend_per_window: 3,
            max_displacement_depth: 3,
            max_candidate_dates: 5,
            objective_weights: ObjectiveWeights::default(),
            phase1_attempts: 1,
            max_improvement_loops: 10,
            seed: 0,
        }
    }

    #[test]
    fn rejects_day_off() {
        let mut worker = Worker::new("a", 100.0);
        worker.days_off.push(crate::model::DateRange::single(d(2026, 1, 5)));
        let config = config();
        let schedule = Schedule::new(config.start_date, config.end_date, |_| 1);
        let targets = HashMap::new();
        assert_eq!(
            can_assign(&worker, d(2026, 1, 5), &schedule, &config, &targets, false),
            Err(Rejection::DayOff)
        );
    }

    #[test]
    fn rejects_min_gap_violation() {
        let worker = Worker::new("a", 100.0);
        let config = config();
        let mut schedule = Schedule::new(config.start_date, config.end_date, |_| 1);
        schedule.assign(d(2026, 1, 1), worker.id.clone());
        let targets = HashMap::new();
        assert_eq!(
            can_assign(&worker, d(2026, 1, 2), &schedule, &config, &targets, false),
            Err(Rejection::MinGapViolated)
        );
    }

    #[test]
    fn accepts_within_rules() {
        let worker = Worker::new("a", 100.0);
        let config = config();
        let schedule = Schedule::new(config.start_date, config.end_date, |_| 1);
        let targets = HashMap::new();
        assert_eq!(can_assign(&worker, d(2026, 1, 1), &schedule, &config, &targets, false), Ok(()));
    }

    #[test]
    fn rejects_exactly_seven_and_fourteen_day_same_weekday_gaps() {
        let worker = Worker::new("a", 100.0);
        let config = config();
        let mut schedule = Schedule::new(config.start_date, config.end_date, |_| 1);
        schedule.assign(d(2026, 1, 5), worker.id.clone());
        let targets = HashMap::new();
        assert_eq!(
            can_assign(&worker, d(2026, 1, 12), &schedule, &config, &targets, false),
            Err(Rejection::WeeklyPatternViolated)
        );
        assert_eq!(
            can_assign(&worker, d(2026, 1, 19), &schedule, &config, &targets, false),
            Err(Rejection::WeeklyPatternViolated)
        );
    }

    #[test]
    fn min_gap_is_checked_against_every_existing_assignment_not_just_the_latest() {
        let worker = Worker::new("a", 100.0);
        let config = config();
        let mut schedule = Schedule::new(config.start_date, config.end_date, |_| 1);
        schedule.assign(d(2026, 1, 1), worker.id.clone());
        schedule.assign(d(2026, 1, 20), worker.id.clone());
        let targets = HashMap::new();
        assert_eq!(
            can_assign(&worker, d(2026, 1, 2), &schedule, &config, &targets, false),
            Err(Rejection::MinGapViolated),
            "Jan 2 is only 1 day from the Jan 1 assignment even though Jan 20 is the latest"
        );
    }

    #[test]
    fn a_ten_day_same_weekday_gap_is_not_forbidden() {
        let worker = Worker::new("a", 100.0);
        let mut config = config();
        config.min_gap_days = 1;
        let mut schedule = Schedule::new(config.start_date, config.end_date, |_| 1);
        schedule.assign(d(2026, 1, 1), worker.id.clone());
        let targets = HashMap::new();
        assert_eq!(can_assign(&worker, d(2026, 1, 11), &schedule, &config, &targets, false), Ok(()));
    }

    #[test]
    fn mandatory_day_is_exempt_from_the_gap_rules() {
        let mut worker = Worker::new("a", 100.0);
        worker.mandatory_days.insert(d(2026, 1, 12));
        let config = config();
        let mut schedule = Schedule::new(config.start_date, config.end_date, |_| 1);
        schedule.assign(d(2026, 1, 5), worker.id.clone());
        let targets = HashMap::new();
        assert_eq!(can_assign(&worker, d(2026, 1, 12), &schedule, &config, &targets, false), Ok(()));
    }

    #[test]
    fn target_reached_is_rejected_unless_mandatory() {
        let mut worker = Worker::new("a", 100.0);
        worker.mandatory_days.insert(d(2026, 1, 10));
        let config = config();
        let mut schedule = Schedule::new(config.start_date, config.end_date, |_| 1);
        schedule.assign(d(2026, 1, 1), worker.id.clone());
        let mut targets = HashMap::new();
        targets.insert(worker.id.clone(), 1);
        assert_eq!(
            can_assign(&worker, d(2026, 1, 5), &schedule, &config, &targets, true),
            Err(Rejection::TargetReached)
        );
        assert_eq!(can_assign(&worker, d(2026, 1, 10), &schedule, &config, &targets, true), Ok(()));
    }
}
