use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("session {0} not found")]
    SessionNotFound(uuid::Uuid),

    #[error("lock {0} not found")]
    LockNotFound(uuid::Uuid),

    #[error("lock {lock_id} is held by a different user")]
    NotLockOwner { lock_id: uuid::Uuid },

    #[error("resource is already locked by another user")]
    ResourceLocked,

    #[error("conflict {0} not found")]
    ConflictNotFound(uuid::Uuid),
}

pub type CoreResult<T> = Result<T, CoreError>;
