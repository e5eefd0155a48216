use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashSet;

use crate::config::SchedulerConfig;

/// Non-exclusive classification of a single date. See spec §3/§4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateClass {
    pub weekday: Weekday,
    pub is_holiday: bool,
    pub is_pre_holiday: bool,
}

impl DateClass {
    pub fn is_friday(&self) -> bool {
        self.weekday == Weekday::Fri
    }

    pub fn is_saturday(&self) -> bool {
        self.weekday == Weekday::Sat
    }

    pub fn is_sunday(&self) -> bool {
        self.weekday == Weekday::Sun
    }

    /// Friday, Saturday, Sunday, holiday, or pre-holiday.
    pub fn is_weekend_like(&self) -> bool {
        self.is_friday() || self.is_saturday() || self.is_sunday() || self.is_holiday || self.is_pre_holiday
    }
}

pub fn is_holiday(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
    holidays.contains(&date)
}

pub fn is_pre_holiday(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
    holidays.contains(&(date + Duration::days(1)))
}

pub fn classify(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> DateClass {
    DateClass {
        weekday: date.weekday(),
        is_holiday: is_holiday(date, holidays),
        is_pre_holiday: is_pre_holiday(date, holidays),
    }
}

pub fn is_weekend_like(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
    classify(date, holidays).is_weekend_like()
}

/// Effective weekday for the purpose of locating the enclosing "weekend":
/// a holiday behaves as Sunday, a pre-holiday as Friday. Grounded in
/// `original_source/utilities.py`'s `get_effective_weekday`.
pub fn effective_weekday(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> Weekday {
    if is_holiday(date, holidays) {
        Weekday::Sun
    } else if is_pre_holiday(date, holidays) {
        Weekday::Fri
    } else {
        date.weekday()
    }
}

/// Friday of the weekend window containing `date`, or the holiday-adjusted
/// equivalent. Grounded in `original_source/utilities.py`'s
/// `get_weekend_start`.
pub fn weekend_start(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> NaiveDate {
    if is_pre_holiday(date, holidays) {
        date
    } else if is_holiday(date, holidays) {
        date - Duration::days(1)
    } else {
        let weekday = date.weekday().num_days_from_monday() as i64;
        if weekday < 4 {
            date + Duration::days(4 - weekday)
        } else {
            date - Duration::days(weekday - 4)
        }
    }
}

/// Number of assignable slots on `date`: the first matching variable-shift
/// rule's count, else the configuration default. See spec §4.1.
pub fn slots_for_date(date: NaiveDate, config: &SchedulerConfig) -> usize {
    for rule in &config.variable_shifts {
        if rule.range.contains(date) {
            return rule.count as usize;
        }
    }
    config.num_shifts as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn pre_holiday_classification() {
        let mut holidays = HashSet::new();
        holidays.insert(d(2026, 12, 25));
        let class = classify(d(2026, 12, 24), &holidays);
        assert!(class.is_pre_holiday);
        assert!(!class.is_holiday);
        assert!(class.is_weekend_like());
    }

    #[test]
    fn weekend_like_is_disjunction() {
        let holidays = HashSet::new();
        // 2026-03-02 is a Monday
        assert!(!is_weekend_like(d(2026, 3, 2), &holidays));
        // 2026-03-06 is a Friday
        assert!(is_weekend_like(d(2026, 3, 6), &holidays));
    }

    #[test]
    fn weekend_start_for_holiday_is_prior_day() {
        let mut holidays = HashSet::new();
        holidays.insert(d(2026, 12, 25));
        assert_eq!(weekend_start(d(2026, 12, 25), &holidays), d(2026, 12, 24));
        assert_eq!(weekend_start(d(2026, 12, 24), &holidays), d(2026, 12, 24));
    }

    #[test]
    fn weekend_start_regular_weekend() {
        let holidays = HashSet::new();
        // Wednesday 2026-03-04 -> Friday 2026-03-06
        assert_eq!(weekend_start(d(2026, 3, 4), &holidays), d(2026, 3, 6));
        // Sunday 2026-03-08 -> Friday 2026-03-06
        assert_eq!(weekend_start(d(2026, 3, 8), &holidays), d(2026, 3, 6));
    }
}
