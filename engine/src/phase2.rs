use chrono::NaiveDate;
use shared::WorkerId;
use std::collections::HashMap;

use crate::config::SchedulerConfig;
use crate::model::{calendar, Schedule};
use crate::scorer::can_assign;

/// Terms of the objective function J minimized by [`improve`]. Lower is
/// better. See spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objective {
    pub load_spread: f64,
    pub weekend_imbalance: f64,
    pub unfilled: f64,
    pub soft_violations: f64,
    pub total: f64,
}

/// A single move the improver considered applying. Kept for diagnostics
/// and for the statistics surface (`stats::find_best_swaps` reuses the
/// same move vocabulary).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Move {
    GapFill { worker: WorkerId, date: NaiveDate },
    DirectTransfer { worker: WorkerId, from: NaiveDate, to: NaiveDate },
    MutualExchange { a: WorkerId, a_date: NaiveDate, b: WorkerId, b_date: NaiveDate },
    LastPostRebalance { worker: WorkerId, from: NaiveDate, to: NaiveDate },
}

pub fn objective(schedule: &Schedule, config: &SchedulerConfig, targets: &HashMap<WorkerId, u32>) -> Objective {
    let ratios: Vec<f64> = targets
        .iter()
        .filter(|(_, &t)| t > 0)
        .map(|(w, &t)| schedule.total_assignments(w) as f64 / t as f64)
        .collect();
    let load_spread = if ratios.is_empty() {
        0.0
    } else {
        let max = ratios.iter().cloned().fold(f64::MIN, f64::max);
        let min = ratios.iter().cloned().fold(f64::MAX, f64::min);
        max - min
    };

    let weekend_counts: Vec<f64> = config
        .workers
        .iter()
        .map(|w| {
            schedule
                .assignments_for(&w.id)
                .iter()
                .filter(|d| calendar::is_weekend_like(**d, &config.holidays))
                .count() as f64
        })
        .collect();
    let weekend_imbalance = if weekend_counts.is_empty() {
        0.0
    } else {
        let mean = weekend_counts.iter().sum::<f64>() / weekend_counts.len() as f64;
        (weekend_counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / weekend_counts.len() as f64).sqrt()
    };

    let unfilled = schedule.total_unfilled() as f64;
    let soft_violations =
        crate::constraints::check_schedule(schedule, config).iter().filter(|v| !v.is_hard()).count() as f64;

    let w = config.objective_weights;
    let total = w.alpha * load_spread + w.beta * weekend_imbalance + w.gamma * unfilled + w.delta * soft_violations;

    Objective { load_spread, weekend_imbalance, unfilled, soft_violations, total }
}

/// Relaxes the strict result with a bounded local-search pass: gap-fill via
/// short displacement chains, direct transfers, mutual exchanges, and a
/// last-post rebalance sweep, accepting each move only if it does not
/// worsen J and never introduces a hard violation. Runs the four passes
/// repeatedly until a full pass applies no move or `max_improvement_loops`
/// is reached. See spec §4.4 Termination.
pub fn improve(schedule: &mut Schedule, config: &SchedulerConfig, targets: &HashMap<WorkerId, u32>) -> Vec<Move> {
    let mut applied = Vec::new();

    for _ in 0..config.max_improvement_loops.max(1) {
        let mut round = Vec::new();
        round.extend(gap_fill_pass(schedule, config, targets));
        round.extend(direct_transfer_pass(schedule, config, targets));
        round.extend(mutual_exchange_pass(schedule, config, targets));
        round.extend(last_post_rebalance_pass(schedule, config, targets));

        if round.is_empty() {
            break;
        }
        applied.extend(round);
    }

    applied
}

fn gap_fill_pass(schedule: &mut Schedule, config: &SchedulerConfig, targets: &HashMap<WorkerId, u32>) -> Vec<Move> {
    let mut applied = Vec::new();
    let open_dates: Vec<NaiveDate> = config.dates().filter(|d| schedule.has_open_slot(*d)).collect();

    for date in open_dates {
        if try_direct_fill(schedule, config, targets, date, &mut applied) {
            continue;
        }
        try_displaced_fill(schedule, config, targets, date, &mut applied);
    }

    applied
}

fn try_direct_fill(
    schedule: &mut Schedule,
    config: &SchedulerConfig,
    targets: &HashMap<WorkerId, u32>,
    date: NaiveDate,
    applied: &mut Vec<Move>,
) -> bool {
    if !schedule.has_open_slot(date) {
        return true;
    }
    let mut candidates: Vec<_> = config
        .workers
        .iter()
        .filter(|w| can_assign(w, date, schedule, config, targets, false).is_ok())
        .collect();
    if candidates.is_empty() {
        return false;
    }
    candidates.sort_by(|a, b| {
        crate::scorer::score(a, date, schedule, config, targets)
            .partial_cmp(&crate::scorer::score(b, date, schedule, config, targets))
            .unwrap()
    });
    let chosen = candidates[0].id.clone();
    schedule.assign(date, chosen.clone());
    applied.push(Move::GapFill { worker: chosen, date });
    true
}

/// Looks for a worker who could fill `date` if one of their existing
/// assignments were moved elsewhere first, up to `max_displacement_depth`
/// hops. See spec §4.4's displacement-chain description.
fn try_displaced_fill(
    schedule: &mut Schedule,
    config: &SchedulerConfig,
    targets: &HashMap<WorkerId, u32>,
    date: NaiveDate,
    applied: &mut Vec<Move>,
) -> bool {
    for worker in &config.workers {
        if worker.is_excluded() {
            continue;
        }
        let existing = schedule.assignments_for(&worker.id).to_vec();
        for &occupied_date in existing.iter().take(config.max_displacement_depth as usize) {
            if occupied_date == date {
                continue;
            }
            let mut trial = schedule.clone();
            trial.unassign(occupied_date, &worker.id);
            if can_assign(worker, date, &trial, config, targets, false).is_err() {
                continue;
            }
            trial.assign(date, worker.id.clone());
            if let Some(replacement) = find_replacement(&trial, config, targets, occupied_date, &worker.id) {
                trial.assign(occupied_date, replacement.clone());
                *schedule = trial;
                applied.push(Move::DirectTransfer { worker: worker.id.clone(), from: occupied_date, to: date });
                return true;
            }
        }
    }
    false
}

fn find_replacement(
    schedule: &Schedule,
    config: &SchedulerConfig,
    targets: &HashMap<WorkerId, u32>,
    date: NaiveDate,
    exclude: &WorkerId,
) -> Option<WorkerId> {
    config
        .workers
        .iter()
        .filter(|w| &w.id != exclude)
        .filter(|w| can_assign(w, date, schedule, config, targets, false).is_ok())
        .min_by(|a, b| {
            crate::scorer::score(a, date, schedule, config, targets)
                .partial_cmp(&crate::scorer::score(b, date, schedule, config, targets))
                .unwrap()
        })
        .map(|w| w.id.clone())
}

fn direct_transfer_pass(schedule: &mut Schedule, config: &SchedulerConfig, targets: &HashMap<WorkerId, u32>) -> Vec<Move> {
    let mut applied = Vec::new();
    let before = objective(schedule, config, targets).total;

    for worker in &config.workers {
        let over_target = targets.get(&worker.id).copied().unwrap_or(0);
        if schedule.total_assignments(&worker.id) as u32 <= over_target {
            continue;
        }
        let dates = schedule.assignments_for(&worker.id).to_vec();
        for &from in &dates {
            if worker.is_mandatory(from) {
                continue;
            }
            let under_targets: Vec<_> = config
                .workers
                .iter()
                .filter(|w| &w.id != &worker.id)
                .filter(|w| schedule.total_assignments(&w.id) < targets.get(&w.id).copied().unwrap_or(0))
                .collect();
            for candidate in under_targets {
                if can_assign(candidate, from, schedule, config, targets, false).is_err() {
                    continue;
                }
                let mut trial = schedule.clone();
                trial.unassign(from, &worker.id);
                trial.assign(from, candidate.id.clone());
                if objective(&trial, config, targets).total < before {
                    *schedule = trial;
                    applied.push(Move::DirectTransfer { worker: candidate.id.clone(), from, to: from });
                    break;
                }
            }
        }
    }

    applied
}

fn mutual_exchange_pass(schedule: &mut Schedule, config: &SchedulerConfig, targets: &HashMap<WorkerId, u32>) -> Vec<Move> {
    let mut applied = Vec::new();
    let before = objective(schedule, config, targets).total;

    let worker_ids: Vec<WorkerId> = config.workers.iter().map(|w| w.id.clone()).collect();
    for (i, a_id) in worker_ids.iter().enumerate() {
        for b_id in worker_ids.iter().skip(i + 1) {
            let a_dates = schedule.assignments_for(a_id).to_vec();
            let b_dates = schedule.assignments_for(b_id).to_vec();
            for &a_date in &a_dates {
                for &b_date in &b_dates {
                    if a_date == b_date {
                        continue;
                    }
                    let Some(a_worker) = config.workers.iter().find(|w| &w.id == a_id) else { continue };
                    let Some(b_worker) = config.workers.iter().find(|w| &w.id == b_id) else { continue };
                    if a_worker.is_mandatory(a_date) || b_worker.is_mandatory(b_date) {
                        continue;
                    }

                    let mut trial = schedule.clone();
                    trial.unassign(a_date, a_id);
                    trial.unassign(b_date, b_id);
                    if can_assign(a_worker, b_date, &trial, config, targets, false).is_err()
                        || can_assign(b_worker, a_date, &trial, config, targets, false).is_err()
                    {
                        continue;
                    }
                    trial.assign(b_date, a_id.clone());
                    trial.assign(a_date, b_id.clone());

                    if objective(&trial, config, targets).total < before {
                        *schedule = trial;
                        applied.push(Move::MutualExchange {
                            a: a_id.clone(),
                            a_date,
                            b: b_id.clone(),
                            b_date,
                        });
                    }
                }
            }
        }
    }

    applied
}

/// Final sweep: if a worker's most recent assignment can be moved to a date
/// that reduces weekend imbalance without worsening J, do it. See spec
/// §4.4's "last post" rebalance step.
fn last_post_rebalance_pass(
    schedule: &mut Schedule,
    config: &SchedulerConfig,
    targets: &HashMap<WorkerId, u32>,
) -> Vec<Move> {
    let mut applied = Vec::new();
    let before = objective(schedule, config, targets).total;

    for worker in &config.workers {
        let Some(&last) = schedule.assignments_for(&worker.id).last() else { continue };
        if worker.is_mandatory(last) {
            continue;
        }
        for candidate_date in config.dates() {
            if candidate_date == last || !schedule.has_open_slot(candidate_date) {
                continue;
            }
            let mut trial = schedule.clone();
            trial.unassign(last, &worker.id);
            if can_assign(worker, candidate_date, &trial, config, targets, false).is_err() {
                continue;
            }
            trial.assign(candidate_date, worker.id.clone());
            if objective(&trial, config, targets).total < before {
                *schedule = trial;
                applied.push(Move::LastPostRebalance { worker: worker.id.clone(), from: last, to: candidate_date });
                break;
            }
        }
    }

    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObjectiveWeights;
    use crate::model::Worker;
    use std::collections::HashSet;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn config(workers: Vec<Worker>) -> SchedulerConfig {
        SchedulerConfig {
            start_date: d(2026, 1, 1),
            end_date: d(2026, 1, 14),
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
            phase1_attempts: 2,
            max_improvement_loops: 10,
            seed: 3,
        }
    }

    #[test]
    fn improve_never_introduces_hard_violations() {
        let config = config(vec![Worker::new("a", 100.0), Worker::new("b", 100.0), Worker::new("c", 100.0)]);
        let targets = crate::quota::compute_targets(&config);
        let mut attempt = crate::phase1::distribute(&config, &targets);
        improve(&mut attempt.schedule, &config, &targets);
        let violations = crate::constraints::check_schedule(&attempt.schedule, &config);
        assert!(violations.iter().all(|v| !v.is_hard()));
    }

    #[test]
    fn improve_does_not_worsen_objective() {
        let config = config(vec![Worker::new("a", 100.0), Worker::new("b", 100.0)]);
        let targets = crate::quota::compute_targets(&config);
        let mut attempt = crate::phase1::distribute(&config, &targets);
        let before = objective(&attempt.schedule, &config, &targets).total;
        improve(&mut attempt.schedule, &config, &targets);
        let after = objective(&attempt.schedule, &config, &targets).total;
        assert!(after <= before + f64::EPSILON);
    }

    #[test]
    fn gap_fill_fills_an_open_slot_when_a_candidate_exists() {
        let config = config(vec![Worker::new("a", 100.0)]);
        let mut schedule = Schedule::new(config.start_date, config.end_date, |dt| calendar::slots_for_date(dt, &config));
        let targets = crate::quota::compute_targets(&config);
        gap_fill_pass(&mut schedule, &config, &targets);
        assert!(schedule.total_unfilled() < (config.total_days() as usize));
    }
}
