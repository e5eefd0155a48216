use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::WorkerId;
use std::collections::{HashMap, HashSet};

use crate::config::SchedulerConfig;
use crate::model::{calendar, Schedule};
use crate::scorer::FORBIDDEN_SAME_WEEKDAY_GAPS;

/// A single constraint breach found by [`check_schedule`]. Every variant
/// here is a quantified invariant of a returned schedule (spec §3/§8) and
/// so every variant is hard — none of these may ever appear in a schedule
/// this engine returns; Phase-2 never trades one of these off against the
/// objective function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Violation {
    /// Two mutually incompatible workers assigned on the same date.
    Incompatibility { date: NaiveDate, a: WorkerId, b: WorkerId },
    /// Two assignments of the same worker closer than `min_gap_days` apart.
    MinGap { worker: WorkerId, first: NaiveDate, second: NaiveDate },
    /// Two assignments of the same worker exactly 7 or 14 days apart (and
    /// so on the same weekday).
    WeeklyPattern { worker: WorkerId, first: NaiveDate, second: NaiveDate },
    /// More than `max_weekend_per_window` weekend-like assignments inside a
    /// sliding window for this worker.
    WeekendCap { worker: WorkerId, window_start: NaiveDate, count: u32 },
    /// Worker assigned on a declared day off.
    DaysOff { worker: WorkerId, date: NaiveDate },
    /// Worker assigned outside every declared work period.
    WorkPeriod { worker: WorkerId, date: NaiveDate },
    /// Same worker filling two slots on the same date.
    DuplicateOnDay { worker: WorkerId, date: NaiveDate },
    /// A mandatory day was not honored.
    MandatoryMissing { worker: WorkerId, date: NaiveDate },
}

impl Violation {
    /// Hard violations break a structural invariant and can never occur in
    /// any schedule this engine produces. All variants are hard; see spec
    /// §3 invariants 7-9 and §8's quantified invariants.
    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            Violation::Incompatibility { .. }
                | Violation::MinGap { .. }
                | Violation::WeeklyPattern { .. }
                | Violation::WeekendCap { .. }
                | Violation::DaysOff { .. }
                | Violation::WorkPeriod { .. }
                | Violation::DuplicateOnDay { .. }
                | Violation::MandatoryMissing { .. }
        )
    }
}

/// Exhaustively re-derives every violation present in `schedule` against
/// `config`. This is a pure function with no side effects, used both as a
/// post-condition check after Phase-1/Phase-2 and by callers validating a
/// schedule they loaded from a backup.
pub fn check_schedule(schedule: &Schedule, config: &SchedulerConfig) -> Vec<Violation> {
    let mut violations = Vec::new();
    let workers_by_id: HashMap<&WorkerId, &crate::model::Worker> =
        config.workers.iter().map(|w| (&w.id, w)).collect();

    for date in schedule.dates() {
        let assigned = schedule.assigned_on(date);

        let mut seen = HashSet::new();
        for worker_id in &assigned {
            if !seen.insert((*worker_id).clone()) {
                violations.push(Violation::DuplicateOnDay { worker: (*worker_id).clone(), date });
            }
        }

        for (i, a) in assigned.iter().enumerate() {
            for b in assigned.iter().skip(i + 1) {
                if *a == *b {
                    continue;
                }
                let incompatible = workers_by_id.get(a).map(|w| w.incompatible_with.contains(*b)).unwrap_or(false)
                    || workers_by_id.get(b).map(|w| w.incompatible_with.contains(*a)).unwrap_or(false)
                    || (workers_by_id.get(a).map(|w| w.is_incompatible).unwrap_or(false)
                        && workers_by_id.get(b).map(|w| w.is_incompatible).unwrap_or(false));
                if incompatible {
                    violations.push(Violation::Incompatibility {
                        date,
                        a: (*a).clone(),
                        b: (*b).clone(),
                    });
                }
            }
        }

        for worker_id in &assigned {
            if let Some(worker) = workers_by_id.get(worker_id) {
                if worker.is_day_off(date) {
                    violations.push(Violation::DaysOff { worker: (*worker_id).clone(), date });
                }
                if !worker.is_within_work_periods(date) {
                    violations.push(Violation::WorkPeriod { worker: (*worker_id).clone(), date });
                }
            }
        }
    }

    for worker in &config.workers {
        for &date in &worker.mandatory_days {
            if !schedule.is_assigned(date, &worker.id) {
                violations.push(Violation::MandatoryMissing { worker: worker.id.clone(), date });
            }
        }

        let dates = schedule.assignments_for(&worker.id);
        for window in dates.windows(2) {
            let gap = (window[1] - window[0]).num_days();
            if gap < config.min_gap_days && !worker.is_mandatory(window[0]) && !worker.is_mandatory(window[1]) {
                violations.push(Violation::MinGap {
                    worker: worker.id.clone(),
                    first: window[0],
                    second: window[1],
                });
            }
        }

        for (i, &first) in dates.iter().enumerate() {
            for &second in dates.iter().skip(i + 1) {
                let gap = (second - first).num_days();
                if !FORBIDDEN_SAME_WEEKDAY_GAPS.contains(&gap) {
                    continue;
                }
                if worker.is_mandatory(first) || worker.is_mandatory(second) {
                    continue;
                }
                violations.push(Violation::WeeklyPattern { worker: worker.id.clone(), first, second });
            }
        }

        violations.extend(weekend_cap_violations(worker, dates, config));
    }

    violations
}

fn weekend_cap_violations(
    worker: &crate::model::Worker,
    dates: &[NaiveDate],
    config: &SchedulerConfig,
) -> Vec<Violation> {
    let weekend_dates: Vec<NaiveDate> =
        dates.iter().copied().filter(|d| calendar::is_weekend_like(*d, &config.holidays)).collect();

    let mut violations = Vec::new();
    let mut seen_windows = HashSet::new();
    for &date in &weekend_dates {
        let window_start = calendar::weekend_start(date, &config.holidays);
        if !seen_windows.insert(window_start) {
            continue;
        }
        let window_end = window_start + chrono::Duration::days(config.weekend_window_days - 1);
        let count = weekend_dates.iter().filter(|d| **d >= window_start && **d <= window_end).count() as u32;
        if count > config.max_weekend_per_window {
            violations.push(Violation::WeekendCap { worker: worker.id.clone(), window_start, count });
        }
    }
    violations
}
