use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::conflict::{ConflictRecord, ConflictResolution};
use crate::error::{CoreError, CoreResult};
use crate::lock::{LockType, ResourceLock};
use crate::session::UserSession;

/// Tuning knobs for a [`CollaborationCore`] instance. Grounded in
/// `original_source/collaboration_manager.py`'s `CollaborationManager.__init__`
/// defaults (5-minute locks, 30-minute sessions, 1-minute cleanup tick).
#[derive(Debug, Clone, Copy)]
pub struct CoreConfig {
    pub default_lock_timeout: Duration,
    pub session_timeout: Duration,
    pub cleanup_interval: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_lock_timeout: Duration::seconds(300),
            session_timeout: Duration::seconds(1800),
            cleanup_interval: Duration::seconds(60),
        }
    }
}

/// Result of an [`CollaborationCore::acquire_lock`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
    /// A new lock was granted.
    Acquired(Uuid),
    /// The caller already held this lock; its expiry was pushed forward.
    Extended(Uuid),
    /// The resource was held by another user and the caller asked to wait.
    Queued,
    /// The resource was held by another user and the caller did not ask to wait.
    Denied,
}

/// Snapshot of overall collaboration state, mirroring
/// `CollaborationManager.get_collaboration_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaborationStatus {
    pub active_sessions: usize,
    pub active_locks: usize,
    pub pending_conflicts: usize,
    pub users_online: usize,
    pub lock_queue_depths: HashMap<String, usize>,
}

/// What [`CollaborationCore::cleanup_expired`] removed in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub expired_locks: usize,
    pub inactive_sessions: usize,
    pub stale_conflicts: usize,
}

struct CoreState {
    active_locks: HashMap<Uuid, ResourceLock>,
    sessions: HashMap<Uuid, UserSession>,
    conflicts: HashMap<Uuid, ConflictRecord>,
    lock_queues: HashMap<(LockType, String), VecDeque<(String, DateTime<Utc>)>>,
}

impl CoreState {
    fn new() -> Self {
        Self {
            active_locks: HashMap::new(),
            sessions: HashMap::new(),
            conflicts: HashMap::new(),
            lock_queues: HashMap::new(),
        }
    }
}

/// In-memory hub for concurrent schedule editing: sessions, resource
/// locks, and conflict records, all guarded by a single mutex since every
/// operation here is a short, synchronous critical section. Grounded in
/// `original_source/collaboration_manager.py`'s `CollaborationManager`,
/// adapted from a module-level singleton to an explicitly constructed,
/// shareable instance (`Arc<CollaborationCore>`).
pub struct CollaborationCore {
    config: CoreConfig,
    state: Mutex<CoreState>,
}

impl CollaborationCore {
    pub fn new(config: CoreConfig) -> Self {
        Self { config, state: Mutex::new(CoreState::new()) }
    }

    pub fn create_session(&self, user_id: impl Into<String>, permissions: HashSet<String>, metadata: Map<String, Value>) -> Uuid {
        let now = Utc::now();
        let session = UserSession::new(user_id, now, permissions, metadata);
        let session_id = session.session_id;
        let mut state = self.state.lock().unwrap();
        tracing::info!(%session_id, user_id = %session.user_id, "created session");
        state.sessions.insert(session_id, session);
        session_id
    }

    pub fn end_session(&self, session_id: Uuid) -> CoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let session = state.sessions.remove(&session_id).ok_or(CoreError::SessionNotFound(session_id))?;
        for lock_id in session.active_locks.clone() {
            release_lock_locked(&mut state, lock_id, &session.user_id);
        }
        tracing::info!(%session_id, user_id = %session.user_id, "ended session");
        Ok(())
    }

    pub fn update_session_activity(&self, session_id: Uuid) -> CoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let session = state.sessions.get_mut(&session_id).ok_or(CoreError::SessionNotFound(session_id))?;
        session.touch(Utc::now());
        Ok(())
    }

    /// See spec §5 "acquire_lock". `wait` enqueues the caller behind the
    /// current holder instead of denying outright; the queue is advisory —
    /// callers poll [`Self::check_lock_status`] to learn when it is their turn.
    pub fn acquire_lock(
        &self,
        user_id: impl Into<String>,
        lock_type: LockType,
        resource_id: impl Into<String>,
        timeout: Option<Duration>,
        metadata: Map<String, Value>,
        wait: bool,
    ) -> LockOutcome {
        let user_id = user_id.into();
        let resource_id = resource_id.into();
        let now = Utc::now();
        let timeout = timeout.unwrap_or(self.config.default_lock_timeout);

        let mut state = self.state.lock().unwrap();

        let existing_id = state
            .active_locks
            .values()
            .find(|l| l.lock_type == lock_type && l.resource_id == resource_id && !l.is_expired_at(now))
            .map(|l| l.lock_id);

        if let Some(lock_id) = existing_id {
            let held_by_caller = state.active_locks.get(&lock_id).map(|l| l.user_id == user_id).unwrap_or(false);
            if held_by_caller {
                let lock = state.active_locks.get_mut(&lock_id).unwrap();
                lock.extend(timeout, now);
                tracing::info!(%lock_id, %user_id, "extended lock");
                return LockOutcome::Extended(lock_id);
            }

            if wait {
                let key = (lock_type, resource_id.clone());
                state.lock_queues.entry(key).or_default().push_back((user_id.clone(), now));
                tracing::info!(%user_id, resource_id = %resource_id, "queued for lock");
                return LockOutcome::Queued;
            }

            tracing::warn!(resource_id = %resource_id, holder = %state.active_locks[&lock_id].user_id, "lock denied");
            return LockOutcome::Denied;
        }

        let lock_id = Uuid::new_v4();
        let lock = ResourceLock {
            lock_id,
            user_id: user_id.clone(),
            lock_type,
            resource_id: resource_id.clone(),
            acquired_at: now,
            expires_at: now + timeout,
            metadata,
        };
        state.active_locks.insert(lock_id, lock);

        if let Some(session) = state.sessions.values_mut().find(|s| s.user_id == user_id) {
            session.active_locks.insert(lock_id);
            session.touch(now);
        }

        tracing::info!(%lock_id, resource_id = %resource_id, %user_id, "acquired lock");
        LockOutcome::Acquired(lock_id)
    }

    pub fn release_lock(&self, lock_id: Uuid, user_id: &str) -> CoreResult<()> {
        let mut state = self.state.lock().unwrap();
        release_lock_locked(&mut state, lock_id, user_id)
    }

    pub fn check_lock_status(&self, lock_type: LockType, resource_id: &str) -> Option<ResourceLock> {
        let now = Utc::now();
        let state = self.state.lock().unwrap();
        state
            .active_locks
            .values()
            .find(|l| l.lock_type == lock_type && l.resource_id == resource_id && !l.is_expired_at(now))
            .cloned()
    }

    pub fn user_locks(&self, user_id: &str) -> Vec<ResourceLock> {
        let now = Utc::now();
        let state = self.state.lock().unwrap();
        state.active_locks.values().filter(|l| l.user_id == user_id && !l.is_expired_at(now)).cloned().collect()
    }

    /// Records a conflict whenever `user_id` attempts an operation against a
    /// resource currently locked by someone else. See spec §5 "detect_conflict".
    pub fn detect_conflict(
        &self,
        operation_type: impl Into<String>,
        resource_id: impl Into<String>,
        user_id: &str,
        proposed_change: Map<String, Value>,
    ) -> Option<ConflictRecord> {
        let resource_id = resource_id.into();
        let operation_type = operation_type.into();
        let now = Utc::now();
        let mut state = self.state.lock().unwrap();

        let blocking = state
            .active_locks
            .values()
            .find(|l| l.resource_id == resource_id && l.user_id != user_id && !l.is_expired_at(now))
            .cloned()?;

        let mut resolution_data = Map::new();
        resolution_data.insert("operation_type".into(), Value::String(operation_type));
        resolution_data.insert("proposed_change".into(), Value::Object(proposed_change));
        resolution_data.insert("blocking_lock".into(), Value::String(blocking.lock_id.to_string()));

        let conflict = ConflictRecord {
            conflict_id: Uuid::new_v4(),
            conflict_type: "resource_locked".into(),
            resource_id,
            users_involved: vec![user_id.to_string(), blocking.user_id.clone()],
            detected_at: now,
            resolution_strategy: ConflictResolution::FirstWriterWins,
            resolved: false,
            resolution_data,
        };

        tracing::warn!(conflict_id = %conflict.conflict_id, "conflict detected");
        state.conflicts.insert(conflict.conflict_id, conflict.clone());
        Some(conflict)
    }

    pub fn resolve_conflict(
        &self,
        conflict_id: Uuid,
        resolution: ConflictResolution,
        resolution_data: Map<String, Value>,
    ) -> CoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let conflict = state.conflicts.get_mut(&conflict_id).ok_or(CoreError::ConflictNotFound(conflict_id))?;
        conflict.resolution_strategy = resolution;
        conflict.resolved = true;
        for (k, v) in resolution_data {
            conflict.resolution_data.insert(k, v);
        }
        tracing::info!(%conflict_id, "resolved conflict");
        Ok(())
    }

    pub fn active_sessions(&self) -> Vec<UserSession> {
        let now = Utc::now();
        let state = self.state.lock().unwrap();
        state.sessions.values().filter(|s| s.is_active(now, self.config.session_timeout)).cloned().collect()
    }

    pub fn collaboration_status(&self) -> CollaborationStatus {
        let now = Utc::now();
        let state = self.state.lock().unwrap();
        let active_sessions: Vec<&UserSession> =
            state.sessions.values().filter(|s| s.is_active(now, self.config.session_timeout)).collect();
        let users_online: HashSet<&str> = active_sessions.iter().map(|s| s.user_id.as_str()).collect();

        CollaborationStatus {
            active_sessions: active_sessions.len(),
            active_locks: state.active_locks.values().filter(|l| !l.is_expired_at(now)).count(),
            pending_conflicts: state.conflicts.values().filter(|c| !c.resolved).count(),
            users_online: users_online.len(),
            lock_queue_depths: state
                .lock_queues
                .iter()
                .map(|((_, resource_id), q)| (resource_id.clone(), q.len()))
                .collect(),
        }
    }

    /// Removes expired locks, inactive sessions, and conflicts resolved more
    /// than 24 hours ago. Mirrors `_cleanup_expired_resources`.
    pub fn cleanup_expired(&self) -> CleanupReport {
        let now = Utc::now();
        let mut state = self.state.lock().unwrap();

        let expired_lock_ids: Vec<Uuid> =
            state.active_locks.iter().filter(|(_, l)| l.is_expired_at(now)).map(|(id, _)| *id).collect();
        for lock_id in &expired_lock_ids {
            state.active_locks.remove(lock_id);
            for session in state.sessions.values_mut() {
                session.active_locks.remove(lock_id);
            }
        }

        let inactive_session_ids: Vec<Uuid> = state
            .sessions
            .values()
            .filter(|s| !s.is_active(now, self.config.session_timeout))
            .map(|s| s.session_id)
            .collect();
        for session_id in &inactive_session_ids {
            state.sessions.remove(session_id);
        }

        let stale_conflict_ids: Vec<Uuid> = state
            .conflicts
            .values()
            .filter(|c| c.is_stale(now, Duration::hours(24)))
            .map(|c| c.conflict_id)
            .collect();
        for conflict_id in &stale_conflict_ids {
            state.conflicts.remove(conflict_id);
        }

        let report = CleanupReport {
            expired_locks: expired_lock_ids.len(),
            inactive_sessions: inactive_session_ids.len(),
            stale_conflicts: stale_conflict_ids.len(),
        };
        if report.expired_locks > 0 || report.inactive_sessions > 0 || report.stale_conflicts > 0 {
            tracing::info!(?report, "cleanup pass complete");
        }
        report
    }

    /// Spawns the background cleanup loop on `self`, returning its handle
    /// so the caller can `abort()` it on shutdown. Mirrors the
    /// `Arc<Self>` + `tokio::spawn` shape of `JobProcessor::start`, but
    /// runs on a fixed interval instead of draining a channel.
    pub fn spawn_cleanup_task(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval = self.config.cleanup_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.to_std().unwrap_or(std::time::Duration::from_secs(60)));
            loop {
                ticker.tick().await;
                self.cleanup_expired();
            }
        })
    }
}

fn release_lock_locked(state: &mut CoreState, lock_id: Uuid, user_id: &str) -> CoreResult<()> {
    let lock = state.active_locks.get(&lock_id).ok_or(CoreError::LockNotFound(lock_id))?;
    if lock.user_id != user_id {
        return Err(CoreError::NotLockOwner { lock_id });
    }
    let key = (lock.lock_type, lock.resource_id.clone());
    state.active_locks.remove(&lock_id);

    for session in state.sessions.values_mut() {
        session.active_locks.remove(&lock_id);
    }

    if let Some(queue) = state.lock_queues.get_mut(&key) {
        if let Some((next_user, _)) = queue.pop_front() {
            tracing::info!(user_id = %next_user, "next in queue for released lock");
        }
    }

    Ok(())
}
