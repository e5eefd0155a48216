use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Category of resource a lock protects. See spec §5.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LockType {
    WorkerAssignment,
    ShiftEdit,
    ScheduleGeneration,
    BulkOperation,
}

/// An exclusive claim on `(lock_type, resource_id)`, held by one user until
/// it expires or is explicitly released.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLock {
    pub lock_id: Uuid,
    pub user_id: String,
    pub lock_type: LockType,
    pub resource_id: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub metadata: Map<String, Value>,
}

impl ResourceLock {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn time_remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    pub fn extend(&mut self, timeout: Duration, now: DateTime<Utc>) {
        self.expires_at = now + timeout;
    }

    pub fn key(&self) -> (LockType, &str) {
        (self.lock_type, self.resource_id.as_str())
    }
}
