//! Session, lock, and conflict bookkeeping for concurrent schedule editing.
//!
//! [`CollaborationCore`] is the single shared state machine a host wraps in
//! an `Arc` and hands to every connected editor. It performs no scheduling
//! itself — it only arbitrates who may touch which resource at once and
//! records when two editors collide. See spec §5.

pub mod conflict;
pub mod core;
pub mod error;
pub mod lock;
pub mod session;

pub use conflict::{ConflictRecord, ConflictResolution};
pub use core::{CleanupReport, CollaborationCore, CollaborationStatus, CoreConfig, LockOutcome};
pub use error::{CoreError, CoreResult};
pub use lock::{LockType, ResourceLock};
pub use session::UserSession;
