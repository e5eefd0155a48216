use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use shared::WorkerId;
use std::collections::HashMap;

use crate::config::SchedulerConfig;
use crate::model::{calendar, Schedule};
use crate::scorer::{can_assign, score};

/// A mandatory day that could not be honored. Surfaced to the caller
/// instead of silently dropped; see spec §4.8/§7 "infeasible mandatories".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedMandatory {
    pub worker: WorkerId,
    pub date: chrono::NaiveDate,
    pub reason: String,
}

/// Outcome of a single randomized attempt at the strict distributor.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub schedule: Schedule,
    pub filled: usize,
    pub total_slots: usize,
    /// Standard deviation of relative load (assigned / target) across
    /// workers with a nonzero target; lower is more equitable.
    pub equity_score: f64,
    pub unresolved_mandatories: Vec<UnresolvedMandatory>,
}

impl Attempt {
    /// Ordering used to pick the winning attempt: most slots filled first,
    /// most equitable distribution as the tiebreak. See spec §4.3.
    fn is_better_than(&self, other: &Attempt) -> bool {
        if self.filled != other.filled {
            return self.filled > other.filled;
        }
        self.equity_score < other.equity_score
    }
}

/// Places every mandatory day first (most-constrained workers first), then
/// greedily fills remaining slots in a per-attempt shuffled date order,
/// scoring feasible candidates and taking the best. Hard constraints are
/// never violated; see spec §4.3.
pub fn run_attempt(config: &SchedulerConfig, targets: &HashMap<WorkerId, u32>, attempt_index: u32) -> Attempt {
    let mut schedule = Schedule::new(config.start_date, config.end_date, |d| calendar::slots_for_date(d, config));
    let mut rng = seed_rng(config.seed, attempt_index);

    let unresolved_mandatories = place_mandatory_days(&mut schedule, config, targets);

    let mut dates: Vec<_> = config.dates().collect();
    dates.shuffle(&mut rng);

    for date in dates {
        while schedule.has_open_slot(date) {
            let mut candidates: Vec<_> = config
                .workers
                .iter()
                .filter(|w| can_assign(w, date, &schedule, config, targets, true).is_ok())
                .collect();
            if candidates.is_empty() {
                break;
            }
            candidates.shuffle(&mut rng);
            candidates.sort_by(|a, b| {
                score(a, date, &schedule, config, targets)
                    .partial_cmp(&score(b, date, &schedule, config, targets))
                    .unwrap()
            });
            let chosen = candidates[0];
            schedule.assign(date, chosen.id.clone());
        }
    }

    let total_slots: usize = config.dates().map(|d| calendar::slots_for_date(d, config)).sum();
    let filled = total_slots - schedule.total_unfilled();
    let equity_score = compute_equity_score(&schedule, config, targets);

    Attempt { schedule, filled, total_slots, equity_score, unresolved_mandatories }
}

fn place_mandatory_days(
    schedule: &mut Schedule,
    config: &SchedulerConfig,
    targets: &HashMap<WorkerId, u32>,
) -> Vec<UnresolvedMandatory> {
    let mut unresolved = Vec::new();
    let mut workers: Vec<_> = config.workers.iter().filter(|w| !w.mandatory_days.is_empty()).collect();
    workers.sort_by_key(|w| w.constrained_availability_days(config.start_date, config.end_date));

    for worker in workers {
        let mut days: Vec<_> = worker.mandatory_days.iter().copied().collect();
        days.sort();
        for date in days {
            if !schedule.has_open_slot(date) {
                unresolved.push(UnresolvedMandatory {
                    worker: worker.id.clone(),
                    date,
                    reason: "no open slot remaining on that date".to_string(),
                });
                continue;
            }
            match can_assign(worker, date, schedule, config, targets, false) {
                Ok(()) => schedule.assign(date, worker.id.clone()),
                Err(rejection) => {
                    unresolved.push(UnresolvedMandatory { worker: worker.id.clone(), date, reason: rejection.reason().to_string() });
                }
            }
        }
    }
    unresolved
}

fn compute_equity_score(schedule: &Schedule, _config: &SchedulerConfig, targets: &HashMap<WorkerId, u32>) -> f64 {
    let ratios: Vec<f64> = targets
        .iter()
        .filter(|(_, &target)| target > 0)
        .map(|(worker, &target)| schedule.total_assignments(worker) as f64 / target as f64)
        .collect();
    if ratios.is_empty() {
        return 0.0;
    }
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    let variance = ratios.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / ratios.len() as f64;
    variance.sqrt()
}

fn seed_rng(base_seed: u64, attempt_index: u32) -> ChaCha20Rng {
    let mut seed = [0u8; 32];
    seed[0..8].copy_from_slice(&base_seed.to_le_bytes());
    seed[8..12].copy_from_slice(&attempt_index.to_le_bytes());
    ChaCha20Rng::from_seed(seed)
}

/// Runs `config.phase1_attempts` independent randomized attempts in
/// parallel and returns the best by [`Attempt::is_better_than`]. Each
/// attempt is deterministic given `(config.seed, attempt_index)`, so the
/// overall result is reproducible despite the parallel execution. Grounded
/// in `other_examples/..asimihsan-constraint-solver..`'s seeded-attempt
/// pattern; uses `std::thread::scope` since this work is purely CPU-bound.
pub fn distribute(config: &SchedulerConfig, targets: &HashMap<WorkerId, u32>) -> Attempt {
    let attempts = config.phase1_attempts.max(1);
    let results: Vec<Attempt> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..attempts)
            .map(|attempt_index| scope.spawn(move || run_attempt(config, targets, attempt_index)))
            .collect();
        handles.into_iter().map(|h| h.join().expect("phase1 attempt panicked")).collect()
    });

    let mut best = None;
    for attempt in results {
        best = match best {
            None => Some(attempt),
            Some(current) if attempt.is_better_than(&current) => Some(attempt),
            Some(current) => Some(current),
        };
    }
    best.expect("at least one attempt runs")
}
