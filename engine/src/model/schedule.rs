use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::WorkerId;
use std::collections::BTreeMap;

/// A single date's assignable slots. `None` marks an unfilled slot.
pub type DaySlots = Vec<Option<WorkerId>>;

/// A full roster: every date in `[start, end]` maps to its slot vector.
///
/// `assignments` is an index inverted from `slots`, kept in sync by the
/// mutation methods below; callers should never construct it by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    slots: BTreeMap<NaiveDate, DaySlots>,
    #[serde(skip)]
    assignments: BTreeMap<WorkerId, Vec<NaiveDate>>,
}

impl Schedule {
    /// Builds an empty schedule with `slot_count(date)` unfilled slots per day.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, mut slot_count: impl FnMut(NaiveDate) -> usize) -> Self {
        let mut slots = BTreeMap::new();
        let mut date = start_date;
        while date <= end_date {
            slots.insert(date, vec![None; slot_count(date)]);
            date += chrono::Duration::days(1);
        }
        Self {
            start_date,
            end_date,
            slots,
            assignments: BTreeMap::new(),
        }
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.slots.keys().copied()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DaySlots> {
        self.slots.get(&date)
    }

    pub fn assignments_for(&self, worker: &WorkerId) -> &[NaiveDate] {
        self.assignments.get(worker).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn assigned_on(&self, date: NaiveDate) -> Vec<&WorkerId> {
        self.slots
            .get(&date)
            .map(|day| day.iter().filter_map(|s| s.as_ref()).collect())
            .unwrap_or_default()
    }

    pub fn is_assigned(&self, date: NaiveDate, worker: &WorkerId) -> bool {
        self.slots
            .get(&date)
            .map(|day| day.iter().any(|s| s.as_deref() == Some(worker.as_str())))
            .unwrap_or(false)
    }

    pub fn has_open_slot(&self, date: NaiveDate) -> bool {
        self.slots.get(&date).map(|day| day.iter().any(|s| s.is_none())).unwrap_or(false)
    }

    pub fn open_slot_count(&self, date: NaiveDate) -> usize {
        self.slots.get(&date).map(|day| day.iter().filter(|s| s.is_none()).count()).unwrap_or(0)
    }

    /// Fills the first open slot on `date` with `worker`. Returns `false` if
    /// the date is unknown or has no open slot.
    pub fn assign(&mut self, date: NaiveDate, worker: WorkerId) -> bool {
        let Some(day) = self.slots.get_mut(&date) else {
            return false;
        };
        let Some(slot) = day.iter_mut().find(|s| s.is_none()) else {
            return false;
        };
        *slot = Some(worker.clone());
        let dates = self.assignments.entry(worker).or_default();
        let pos = dates.binary_search(&date).unwrap_or_else(|p| p);
        dates.insert(pos, date);
        true
    }

    /// Clears every slot on `date` holding `worker`. Returns `false` if the
    /// worker was not assigned on that date.
    pub fn unassign(&mut self, date: NaiveDate, worker: &WorkerId) -> bool {
        let Some(day) = self.slots.get_mut(&date) else {
            return false;
        };
        let mut found = false;
        for slot in day.iter_mut() {
            if slot.as_deref() == Some(worker.as_str()) {
                *slot = None;
                found = true;
            }
        }
        if found {
            if let Some(dates) = self.assignments.get_mut(worker) {
                dates.retain(|d| *d != date);
            }
        }
        found
    }

    /// Moves `worker`'s assignment from `from` to `to`, atomically: fails
    /// (leaving state unchanged) if `worker` isn't assigned on `from` or
    /// `to` has no open slot.
    pub fn move_assignment(&mut self, from: NaiveDate, to: NaiveDate, worker: &WorkerId) -> bool {
        if !self.is_assigned(from, worker) || !self.has_open_slot(to) {
            return false;
        }
        self.unassign(from, worker);
        self.assign(to, worker.clone());
        true
    }

    pub fn total_assignments(&self, worker: &WorkerId) -> usize {
        self.assignments.get(worker).map(|v| v.len()).unwrap_or(0)
    }

    pub fn total_unfilled(&self) -> usize {
        self.slots.values().map(|day| day.iter().filter(|s| s.is_none()).count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn assign_and_unassign_round_trip() {
        let mut schedule = Schedule::new(d(2026, 1, 1), d(2026, 1, 3), |_| 1);
        let w = WorkerId::new("w1");
        assert!(schedule.assign(d(2026, 1, 2), w.clone()));
        assert!(schedule.is_assigned(d(2026, 1, 2), &w));
        assert_eq!(schedule.assignments_for(&w), &[d(2026, 1, 2)]);
        assert!(schedule.unassign(d(2026, 1, 2), &w));
        assert!(!schedule.is_assigned(d(2026, 1, 2), &w));
        assert!(schedule.assignments_for(&w).is_empty());
    }

    #[test]
    fn assign_fails_when_no_open_slot() {
        let mut schedule = Schedule::new(d(2026, 1, 1), d(2026, 1, 1), |_| 1);
        assert!(schedule.assign(d(2026, 1, 1), WorkerId::new("w1")));
        assert!(!schedule.assign(d(2026, 1, 1), WorkerId::new("w2")));
    }

    #[test]
    fn move_assignment_is_atomic_on_failure() {
        let mut schedule = Schedule::new(d(2026, 1, 1), d(2026, 1, 2), |_| 1);
        let w1 = WorkerId::new("w1");
        let w2 = WorkerId::new("w2");
        schedule.assign(d(2026, 1, 1), w1.clone());
        schedule.assign(d(2026, 1, 2), w2);
        assert!(!schedule.move_assignment(d(2026, 1, 1), d(2026, 1, 2), &w1));
        assert!(schedule.is_assigned(d(2026, 1, 1), &w1));
    }

    #[test]
    fn total_unfilled_counts_every_empty_slot() {
        let schedule = Schedule::new(d(2026, 1, 1), d(2026, 1, 2), |_| 2);
        assert_eq!(schedule.total_unfilled(), 4);
    }
}
