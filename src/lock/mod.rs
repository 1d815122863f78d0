//! Keyed locks for serializing read-check-write cycles.
//!
//! A `LockManager` hands out one logical lock per record key (`"courses:5"`,
//! `"users:12"`). `LockManager::acquire_all` takes several keys at once in a
//! fixed order and returns a `LockGuard` that releases them when dropped, so
//! two callers asking for overlapping key sets cannot deadlock.

mod error;
mod in_memory;
mod lock_manager;

pub use error::LockError;
pub use in_memory::{InMemoryLock, InMemoryLockManager};
pub use lock_manager::{LockGuard, LockManager};

/// One record's lock.
///
/// `InMemoryLock` only serializes callers inside one process. Several server
/// processes sharing a database would need a lock held in that database.
pub trait Lock: Send + Sync {
    /// Block until the lock is held.
    fn lock(&self) -> Result<(), LockError>;

    /// Take the lock if it is free. `Ok(false)` means someone else holds it.
    fn try_lock(&self) -> Result<bool, LockError>;

    /// Release the lock. Releasing a free lock is a no-op.
    fn unlock(&self) -> Result<(), LockError>;
}
