use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Strategy applied (or to be applied) when resolving a [`ConflictRecord`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    LastWriterWins,
    FirstWriterWins,
    ManualResolution,
    AutomaticMerge,
}

/// A detected collision between two users editing the same resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub conflict_id: Uuid,
    pub conflict_type: String,
    pub resource_id: String,
    pub users_involved: Vec<String>,
    pub detected_at: DateTime<Utc>,
    pub resolution_strategy: ConflictResolution,
    pub resolved: bool,
    pub resolution_data: Map<String, Value>,
}

impl ConflictRecord {
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        self.resolved && now - self.detected_at > max_age
    }
}
