use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::WorkerId;
use std::collections::HashMap;

use crate::config::SchedulerConfig;
use crate::model::{calendar, Schedule};
use crate::scorer::can_assign;

/// Per-worker summary of how far the final schedule landed from its target.
/// Grounded in `original_source/adjustment_utils.py`'s deviation reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deviation {
    pub worker: WorkerId,
    pub target: u32,
    pub assigned: u32,
    /// `assigned - target`; negative means under-scheduled.
    pub delta: i64,
    pub weekend_assigned: u32,
}

pub fn deviations(schedule: &Schedule, config: &SchedulerConfig, targets: &HashMap<WorkerId, u32>) -> Vec<Deviation> {
    config
        .workers
        .iter()
        .map(|worker| {
            let assigned = schedule.total_assignments(&worker.id) as u32;
            let target = targets.get(&worker.id).copied().unwrap_or(0);
            let weekend_assigned = schedule
                .assignments_for(&worker.id)
                .iter()
                .filter(|d| calendar::is_weekend_like(**d, &config.holidays))
                .count() as u32;
            Deviation { worker: worker.id.clone(), target, assigned, delta: assigned as i64 - target as i64, weekend_assigned }
        })
        .collect()
}

/// A single feasible swap the host could offer a worker who wants relief on
/// `date`: another worker who could legally take it, ranked best-first.
/// Bounded to `config.max_candidate_dates` entries, mirroring the
/// `[:5]`/`[:3]` candidate slicing in `adjustment_utils.py`'s
/// `TurnAdjustmentManager`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwapCandidate {
    pub date: NaiveDate,
    pub replacement: WorkerId,
}

pub fn find_best_swaps(
    schedule: &Schedule,
    config: &SchedulerConfig,
    targets: &HashMap<WorkerId, u32>,
    worker: &WorkerId,
    date: NaiveDate,
) -> Vec<SwapCandidate> {
    if !schedule.is_assigned(date, worker) {
        return Vec::new();
    }

    let mut trial = schedule.clone();
    trial.unassign(date, worker);

    let mut candidates: Vec<SwapCandidate> = config
        .workers
        .iter()
        .filter(|w| &w.id != worker)
        .filter(|w| can_assign(w, date, &trial, config, targets, false).is_ok())
        .map(|w| SwapCandidate { date, replacement: w.id.clone() })
        .collect();

    candidates.sort_by(|a, b| {
        let score_a = crate::scorer::score(
            config.workers.iter().find(|w| w.id == a.replacement).unwrap(),
            date,
            &trial,
            config,
            targets,
        );
        let score_b = crate::scorer::score(
            config.workers.iter().find(|w| w.id == b.replacement).unwrap(),
            date,
            &trial,
            config,
            targets,
        );
        score_a.partial_cmp(&score_b).unwrap()
    });

    candidates.truncate(config.max_candidate_dates);
    candidates
}
