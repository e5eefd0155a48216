use shared::WorkerId;
use std::collections::HashMap;

use crate::config::SchedulerConfig;
use crate::model::calendar;

/// Per-worker assignment target for the run. Workers with an explicit
/// `target_shifts` keep it verbatim; the remainder of total slots is
/// apportioned across the auto-calculated workers by largest remainder,
/// weighted by `work_percentage`. See spec §4.2.
pub fn compute_targets(config: &SchedulerConfig) -> HashMap<WorkerId, u32> {
    let mut targets = HashMap::new();

    let total_slots: usize = config.dates().map(|date| calendar::slots_for_date(date, config)).sum();

    let mut fixed_total = 0u32;
    let mut auto_workers: Vec<&crate::model::Worker> = Vec::new();
    for worker in &config.workers {
        if worker.is_excluded() {
            targets.insert(worker.id.clone(), 0);
            continue;
        }
        if let Some(t) = worker.target_shifts {
            targets.insert(worker.id.clone(), t);
            fixed_total += t;
            continue;
        }
        auto_workers.push(worker);
    }

    let remaining = (total_slots as u32).saturating_sub(fixed_total);
    if auto_workers.is_empty() {
        return targets;
    }

    let weight_sum: f64 = auto_workers.iter().map(|w| w.work_percentage).sum();
    if weight_sum <= 0.0 {
        for worker in &auto_workers {
            targets.insert(worker.id.clone(), 0);
        }
        return targets;
    }

    let mut floors = Vec::with_capacity(auto_workers.len());
    let mut remainders = Vec::with_capacity(auto_workers.len());
    let mut floor_total = 0u32;
    for worker in &auto_workers {
        let exact = remaining as f64 * worker.work_percentage / weight_sum;
        let floor = exact.floor();
        floors.push(floor as u32);
        remainders.push(exact - floor);
        floor_total += floor as u32;
    }

    let mut leftover = remaining.saturating_sub(floor_total) as usize;
    let mut order: Vec<usize> = (0..auto_workers.len()).collect();
    order.sort_by(|&a, &b| remainders[b].partial_cmp(&remainders[a]).unwrap());

    for &idx in order.iter() {
        if leftover == 0 {
            break;
        }
        floors[idx] += 1;
        leftover -= 1;
    }

    for (worker, target) in auto_workers.iter().zip(floors) {
        targets.insert(worker.id.clone(), target);
    }

    targets
}

impl SchedulerConfig {
    pub fn dates(&self) -> impl Iterator<Item = chrono::NaiveDate> {
        let mut date = self.start_date;
        let end = self.end_date;
        std::iter::from_fn(move || {
            if date > end {
                None
            } else {
                let current = date;
                date += chrono::Duration::days(1);
                Some(current)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObjectiveWeights;
    use crate::model::Worker;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn config_with(workers: Vec<Worker>) -> SchedulerConfig {
        SchedulerConfig {
            start_date: d(2026, 1, 1),
            end_date: d(2026, 1, 10),
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
            phase1_attempts: 4,
            max_improvement_loops: 10,
            seed: 1,
        }
    }

    #[test]
    fn equal_weights_split_ten_slots_evenly() {
        let config = config_with(vec![Worker::new("a", 100.0), Worker::new("b", 100.0)]);
        let targets = compute_targets(&config);
        assert_eq!(targets[&WorkerId::new("a")] + targets[&WorkerId::new("b")], 10);
        assert_eq!(targets[&WorkerId::new("a")].abs_diff(targets[&WorkerId::new("b")]), 0);
    }

    #[test]
    fn fixed_target_is_honored_and_excluded_from_remainder() {
        let mut w1 = Worker::new("a", 100.0);
        w1.target_shifts = Some(3);
        w1.auto_calculate_shifts = false;
        let config = config_with(vec![w1, Worker::new("b", 100.0)]);
        let targets = compute_targets(&config);
        assert_eq!(targets[&WorkerId::new("a")], 3);
        assert_eq!(targets[&WorkerId::new("b")], 7);
    }

    #[test]
    fn excluded_worker_gets_zero_target() {
        let config = config_with(vec![Worker::new("a", 0.0), Worker::new("b", 100.0)]);
        let targets = compute_targets(&config);
        assert_eq!(targets[&WorkerId::new("a")], 0);
        assert_eq!(targets[&WorkerId::new("b")], 10);
    }

    #[test]
    fn remainder_sums_exactly_to_total_slots() {
        let config = config_with(vec![
            Worker::new("a", 30.0),
            Worker::new("b", 30.0),
            Worker::new("c", 40.0),
        ]);
        let targets = compute_targets(&config);
        let sum: u32 = targets.values().sum();
        assert_eq!(sum, 10);
    }
}
