use chrono::NaiveDate;
use shared::WorkerId;
use thiserror::Error;

/// Configuration errors are rejected at entry; no partial state is produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("start_date {start} is after end_date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("num_shifts must be at least 1, got {0}")]
    NonPositiveSlotCount(u32),

    #[error("variable shift rules overlap: [{a_start}, {a_end}] and [{b_start}, {b_end}]")]
    OverlappingVariableShifts {
        a_start: NaiveDate,
        a_end: NaiveDate,
        b_start: NaiveDate,
        b_end: NaiveDate,
    },

    #[error("worker {worker_id} has invalid work_percentage {percentage}")]
    InvalidWorkPercentage { worker_id: WorkerId, percentage: f64 },

    #[error("no workers supplied")]
    NoWorkers,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
