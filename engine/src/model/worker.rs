use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::WorkerId;
use std::collections::HashSet;

/// Inclusive date range, as used for `work_periods` and `days_off`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Length in days, inclusive.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Overlap length (in days) between this range and another, 0 if disjoint.
    pub fn overlap_days(&self, other: &DateRange) -> i64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start > end {
            0
        } else {
            (end - start).num_days() + 1
        }
    }
}

/// A single doctor in the pool. See spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    /// Fraction of full-time, in (0, 100]. 0 is accepted and treated as excluded.
    pub work_percentage: f64,
    /// Host-supplied override of the computed target; verbatim if present.
    pub target_shifts: Option<u32>,
    pub auto_calculate_shifts: bool,
    /// Group flag: cannot be co-assigned with any other worker also bearing it.
    pub is_incompatible: bool,
    pub incompatible_with: HashSet<WorkerId>,
    pub mandatory_days: HashSet<NaiveDate>,
    pub days_off: Vec<DateRange>,
    /// Empty means "always available inside the global period".
    pub work_periods: Vec<DateRange>,
}

impl Worker {
    pub fn new(id: impl Into<WorkerId>, work_percentage: f64) -> Self {
        Self {
            id: id.into(),
            work_percentage,
            target_shifts: None,
            auto_calculate_shifts: true,
            is_incompatible: false,
            incompatible_with: HashSet::new(),
            mandatory_days: HashSet::new(),
            days_off: Vec::new(),
            work_periods: Vec::new(),
        }
    }

    pub fn is_excluded(&self) -> bool {
        self.work_percentage <= 0.0
    }

    pub fn is_day_off(&self, date: NaiveDate) -> bool {
        self.days_off.iter().any(|r| r.contains(date))
    }

    /// Whether `date` falls inside some declared work period; vacuously true
    /// when no periods were declared (available throughout the global period).
    pub fn is_within_work_periods(&self, date: NaiveDate) -> bool {
        self.work_periods.is_empty() || self.work_periods.iter().any(|r| r.contains(date))
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        self.is_within_work_periods(date) && !self.is_day_off(date)
    }

    pub fn is_mandatory(&self, date: NaiveDate) -> bool {
        self.mandatory_days.contains(&date)
    }

    /// Total length of this worker's declared work periods, clamped to
    /// `[global_start, global_end]`. Used to rank mandatory placement order
    /// (§4.3: "tighter work_periods ... ascending, most constrained first").
    pub fn constrained_availability_days(&self, global_start: NaiveDate, global_end: NaiveDate) -> i64 {
        if self.work_periods.is_empty() {
            return (global_end - global_start).num_days() + 1;
        }
        let global = DateRange::new(global_start, global_end);
        self.work_periods.iter().map(|r| global.overlap_days(r)).sum()
    }
}
