use tracing::{debug, error, info, warn};

use super::relationship::Relationship;
use crate::entities::User;
use crate::error::HubError;
use crate::lock::{InMemoryLockManager, LockManager};
use crate::model::{storage_key, Model, ModelError, ModelStore, PendingWrite};

/// How many times a read-check-write cycle is attempted when the final
/// commit finds a record changed underneath it.
pub(super) const MAX_COMMIT_ATTEMPTS: usize = 3;

/// Keeps parent rosters and user reverse indexes in step.
///
/// Holds no entity state: every call re-reads both records. Each join/leave
/// locks the parent key and the user key, reads both, applies the change to
/// both in memory, and writes both in a single `ModelStore::commit` checked
/// against the versions it read.
pub struct RosterService<S, L = InMemoryLockManager> {
    pub(super) store: S,
    pub(super) locks: L,
}

impl<S: ModelStore> RosterService<S> {
    pub fn new(store: S) -> Self {
        Self::with_lock_manager(store, InMemoryLockManager::new())
    }
}

impl<S: ModelStore, L: LockManager> RosterService<S, L> {
    pub fn with_lock_manager(store: S, locks: L) -> Self {
        Self { store, locks }
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn locks(&self) -> &L {
        &self.locks
    }

    /// Add `user_id` to the parent's roster and the parent to the user's
    /// reverse index. Returns the updated parent.
    ///
    /// Checks, in order: parent exists, user exists, capacity, not already a
    /// member.
    pub fn join<R: Relationship>(&self, parent_id: u64, user_id: u64) -> Result<R::Parent, HubError> {
        let parent = self.update_pair::<R, _>(parent_id, user_id, |parent, user| {
            if let Some(max) = R::capacity(parent) {
                if R::count(parent) >= max {
                    return Err(HubError::Capacity(R::MESSAGES.full.into()));
                }
            }
            if R::members(parent).contains(&user_id) {
                return Err(HubError::Conflict(R::MESSAGES.already_member.into()));
            }

            let roster = R::roster(parent);
            roster.members.push(user_id);
            *roster.count += 1;

            let index = R::reverse_index_mut(user);
            if !index.contains(&parent_id) {
                index.push(parent_id);
            }
            Ok(())
        })?;

        info!(
            relationship = R::NAME,
            parent_id,
            user_id,
            count = R::count(&parent),
            "member joined"
        );
        Ok(parent)
    }

    /// Remove `user_id` from the parent's roster and the parent from the
    /// user's reverse index. Returns the updated parent.
    pub fn leave<R: Relationship>(&self, parent_id: u64, user_id: u64) -> Result<R::Parent, HubError> {
        let parent = self.update_pair::<R, _>(parent_id, user_id, |parent, user| {
            let roster = R::roster(parent);
            let position = roster
                .members
                .iter()
                .position(|id| *id == user_id)
                .ok_or_else(|| HubError::Conflict(R::MESSAGES.not_member.into()))?;
            roster.members.remove(position);

            if *roster.count == 0 {
                warn!(
                    relationship = R::NAME,
                    parent_id,
                    user_id,
                    "roster count already zero on leave, keeping it at zero"
                );
            } else {
                *roster.count -= 1;
            }

            R::reverse_index_mut(user).retain(|id| *id != parent_id);
            Ok(())
        })?;

        info!(
            relationship = R::NAME,
            parent_id,
            user_id,
            count = R::count(&parent),
            "member left"
        );
        Ok(parent)
    }

    /// Parents listed in the user's reverse index, ordered by id.
    ///
    /// Ids that no longer resolve are skipped and logged.
    pub fn memberships<R: Relationship>(&self, user_id: u64) -> Result<Vec<R::Parent>, HubError> {
        let (user, _) = self.load_user(user_id)?;

        let mut parents = Vec::with_capacity(R::reverse_index(&user).len());
        for parent_id in R::reverse_index(&user) {
            match self.store.get_model::<R::Parent>(*parent_id)? {
                Some(versioned) => parents.push(versioned.data),
                None => warn!(
                    relationship = R::NAME,
                    user_id,
                    parent_id,
                    "reverse index points at a missing record"
                ),
            }
        }

        parents.sort_by_key(|parent| parent.id());
        parents.dedup_by_key(|parent| parent.id());
        debug!(relationship = R::NAME, user_id, count = parents.len(), "listed memberships");
        Ok(parents)
    }

    pub(super) fn load_parent<R: Relationship>(
        &self,
        parent_id: u64,
    ) -> Result<(R::Parent, u64), HubError> {
        self.store
            .get_model::<R::Parent>(parent_id)?
            .map(|versioned| (versioned.data, versioned.version))
            .ok_or_else(|| HubError::NotFound(R::MESSAGES.parent_not_found.into()))
    }

    pub(super) fn load_user(&self, user_id: u64) -> Result<(User, u64), HubError> {
        self.store
            .get_model::<User>(user_id)?
            .map(|versioned| (versioned.data, versioned.version))
            .ok_or_else(|| HubError::NotFound("User not found".into()))
    }

    /// Locked read-modify-write of one (parent, user) pair.
    fn update_pair<R, F>(&self, parent_id: u64, user_id: u64, mutate: F) -> Result<R::Parent, HubError>
    where
        R: Relationship,
        F: Fn(&mut R::Parent, &mut User) -> Result<(), HubError>,
    {
        let parent_key = storage_key(<R::Parent as Model>::COLLECTION, parent_id);
        let user_key = storage_key(User::COLLECTION, user_id);
        let _guard = self.locks.acquire_all(&[parent_key.as_str(), user_key.as_str()])?;

        let mut attempt = 1;
        loop {
            let (mut parent, parent_version) = self.load_parent::<R>(parent_id)?;
            let (mut user, user_version) = self.load_user(user_id)?;

            mutate(&mut parent, &mut user)?;

            let writes = vec![
                PendingWrite::update(&parent, parent_version)?,
                PendingWrite::update(&user, user_version)?,
            ];
            match self.store.commit(writes) {
                Ok(()) => return Ok(parent),
                Err(ModelError::ConcurrencyConflict { collection, id, .. })
                    if attempt < MAX_COMMIT_ATTEMPTS =>
                {
                    warn!(
                        relationship = R::NAME,
                        collection = %collection,
                        id,
                        attempt,
                        "record changed outside the roster lock, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        relationship = R::NAME,
                        parent_id,
                        user_id,
                        error = %e,
                        "roster commit failed"
                    );
                    return Err(e.into());
                }
            }
        }
    }
}
