use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use uuid::Uuid;

/// A connected editor's session: who they are, what locks they currently
/// hold, and when they were last seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub active_locks: HashSet<Uuid>,
    pub permissions: HashSet<String>,
    pub metadata: Map<String, Value>,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>, permissions: HashSet<String>, metadata: Map<String, Value>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: Uuid::new_v4(),
            started_at: now,
            last_activity: now,
            active_locks: HashSet::new(),
            permissions,
            metadata,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        self.last_activity > now - timeout
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }
}
