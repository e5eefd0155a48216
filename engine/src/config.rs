use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::model::worker::{DateRange, Worker};

/// A period during which `num_shifts` is overridden by `count`. See spec §4.1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariableShiftRule {
    pub range: DateRange,
    pub count: u32,
}

/// Tunable weights for the Phase-2 objective function J. See spec §4.4.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ObjectiveWeights {
    /// Weight on the spread between max and min relative load.
    pub alpha: f64,
    /// Weight on total weekend-like assignments imbalance.
    pub beta: f64,
    /// Weight on the count of remaining unfilled slots.
    pub gamma: f64,
    /// Weight on the count of soft-constraint violations.
    pub delta: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.5,
            gamma: 2.0,
            delta: 1.5,
        }
    }
}

/// Full input to a single schedule generation run. See spec §3/§4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub num_shifts: u32,
    pub variable_shifts: Vec<VariableShiftRule>,
    pub holidays: HashSet<NaiveDate>,
    pub workers: Vec<Worker>,
    /// Minimum gap, in days, between any two assignments of the same worker.
    pub min_gap_days: i64,
    /// Sliding window length, in days, for the weekend-assignment cap.
    pub weekend_window_days: i64,
    /// Maximum weekend-like assignments allowed inside any weekend window.
    pub max_weekend_per_window: u32,
    /// Number of displacement hops considered during Phase-2 gap-fill.
    pub max_displacement_depth: u32,
    /// Upper bound on candidate swap dates surfaced to a caller (§4.7/§4.8).
    pub max_candidate_dates: usize,
    pub objective_weights: ObjectiveWeights,
    /// Number of independent randomized Phase-1 attempts to run.
    pub phase1_attempts: u32,
    /// Upper bound on full passes Phase-2 runs before giving up, even if a
    /// pass is still applying moves. See spec §4.4 Termination.
    pub max_improvement_loops: u32,
    /// Base seed; each attempt derives its own seed from `(seed, attempt_index)`.
    pub seed: u64,
}

impl SchedulerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.start_date > self.end_date {
            return Err(ConfigError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.num_shifts < 1 {
            return Err(ConfigError::NonPositiveSlotCount(self.num_shifts));
        }
        for (i, a) in self.variable_shifts.iter().enumerate() {
            for b in self.variable_shifts.iter().skip(i + 1) {
                if a.range.overlap_days(&b.range) > 0 {
                    return Err(ConfigError::OverlappingVariableShifts {
                        a_start: a.range.start,
                        a_end: a.range.end,
                        b_start: b.range.start,
                        b_end: b.range.end,
                    });
                }
            }
        }
        if self.workers.is_empty() {
            return Err(ConfigError::NoWorkers);
        }
        for worker in &self.workers {
            if worker.work_percentage < 0.0 || worker.work_percentage > 100.0 {
                return Err(ConfigError::InvalidWorkPercentage {
                    worker_id: worker.id.clone(),
                    percentage: worker.work_percentage,
                });
            }
        }
        Ok(())
    }

    pub fn total_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}
