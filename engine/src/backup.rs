use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::Schedule;

/// Host-facing serialization envelope for a generated schedule. Unknown
/// top-level fields round-trip unchanged via `extra`, so a newer host
/// writing fields this engine doesn't know about doesn't lose them when the
/// document passes back through an older engine version. See spec §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDocument {
    pub schedule: Schedule,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BackupDocument {
    pub fn new(schedule: Schedule, generated_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self { schedule, generated_at, extra: Map::new() }
    }
}
