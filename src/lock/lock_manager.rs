use std::sync::Arc;

use tracing::warn;

use super::{Lock, LockError};

/// Hands out one lock per record key.
///
/// The roster service locks the parent record and the user record of every
/// join/leave through `acquire_all`.
pub trait LockManager: Send + Sync + Sized {
    type Lock: Lock;

    /// Get (or create) the lock for `key`.
    ///
    /// Callers holding the returned `Arc` at the same time must share one
    /// logical lock.
    fn get_lock(&self, key: &str) -> Result<Arc<Self::Lock>, LockError>;

    /// Called by `LockGuard` after it has unlocked `key` and dropped its
    /// handle. Managers that create locks on demand forget idle ones here.
    fn release(&self, _key: &str) -> Result<(), LockError> {
        Ok(())
    }

    /// Lock every key, blocking until all are held.
    ///
    /// Keys are sorted and de-duplicated before locking. If any acquire
    /// fails, the locks already taken are released before returning.
    fn acquire_all(&self, keys: &[&str]) -> Result<LockGuard<'_, Self>, LockError> {
        let mut unique: Vec<&str> = keys.to_vec();
        unique.sort_unstable();
        unique.dedup();

        let mut guard = LockGuard {
            manager: self,
            held: Vec::with_capacity(unique.len()),
        };
        for key in unique {
            let lock = self.get_lock(key)?;
            if let Err(e) = lock.lock() {
                drop(lock);
                if let Err(release) = self.release(key) {
                    warn!(key = %key, error = %release, "failed to forget lock");
                }
                return Err(e);
            }
            guard.held.push((key.to_string(), lock));
        }

        Ok(guard)
    }
}

/// Locks taken by `LockManager::acquire_all`, released in reverse order on drop.
pub struct LockGuard<'a, M: LockManager> {
    manager: &'a M,
    held: Vec<(String, Arc<M::Lock>)>,
}

impl<M: LockManager> LockGuard<'_, M> {
    /// Keys held by this guard, in acquisition order.
    pub fn keys(&self) -> Vec<&str> {
        self.held.iter().map(|(key, _)| key.as_str()).collect()
    }
}

impl<M: LockManager> Drop for LockGuard<'_, M> {
    fn drop(&mut self) {
        while let Some((key, lock)) = self.held.pop() {
            if let Err(e) = lock.unlock() {
                warn!(key = %key, error = %e, "failed to release lock");
            }
            drop(lock);
            if let Err(e) = self.manager.release(&key) {
                warn!(key = %key, error = %e, "failed to forget lock");
            }
        }
    }
}
