//! Repair of rosters whose two sides have drifted apart.
//!
//! Records written before the roster service existed (or edited by hand in
//! the JSON fallback file) can carry duplicate roster ids, stale counts,
//! ids of users that no longer exist, or one-sided references. `reconcile`
//! rewrites one parent and every user touching it so both sides agree again.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};

use super::relationship::Relationship;
use super::service::{RosterService, MAX_COMMIT_ATTEMPTS};
use crate::entities::User;
use crate::error::HubError;
use crate::lock::LockManager;
use crate::model::{storage_key, Model, ModelError, ModelStore, PendingWrite, Versioned};

/// What `reconcile` changed for one parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub parent_id: u64,
    /// Roster entries dropped because the id appeared earlier in the roster.
    pub duplicates_removed: Vec<u64>,
    /// Roster entries dropped because no such user exists.
    pub unknown_users_removed: Vec<u64>,
    pub count_before: u64,
    pub count_after: u64,
    /// Members whose reverse index was missing the parent.
    pub users_linked: Vec<u64>,
    /// Non-members whose reverse index still listed the parent.
    pub users_unlinked: Vec<u64>,
}

impl ReconcileReport {
    /// True when nothing needed repair.
    pub fn is_clean(&self) -> bool {
        self.duplicates_removed.is_empty()
            && self.unknown_users_removed.is_empty()
            && self.count_before == self.count_after
            && self.users_linked.is_empty()
            && self.users_unlinked.is_empty()
    }
}

struct Repair {
    report: ReconcileReport,
    writes: Vec<PendingWrite>,
    touched_users: Vec<u64>,
}

impl<S: ModelStore, L: LockManager> RosterService<S, L> {
    /// Restore both invariants for one parent: the roster holds each existing
    /// user at most once with a matching count, and exactly the roster's
    /// users list the parent in their reverse index.
    pub fn reconcile<R: Relationship>(&self, parent_id: u64) -> Result<ReconcileReport, HubError> {
        let mut attempt = 1;
        loop {
            let keys = self.discover_keys::<R>(parent_id)?;
            let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            let _guard = self.locks.acquire_all(&key_refs)?;

            let repair = self.plan_repair::<R>(parent_id)?;

            let uncovered = repair
                .touched_users
                .iter()
                .any(|id| !keys.contains(&storage_key(User::COLLECTION, *id)));
            if uncovered {
                if attempt >= MAX_COMMIT_ATTEMPTS {
                    return Err(HubError::Internal(format!(
                        "membership of {} {} kept changing during reconcile",
                        <R::Parent as Model>::COLLECTION,
                        parent_id
                    )));
                }
                attempt += 1;
                continue;
            }

            if repair.writes.is_empty() {
                return Ok(repair.report);
            }

            match self.store.commit(repair.writes) {
                Ok(()) => {
                    let report = repair.report;
                    warn!(
                        relationship = R::NAME,
                        parent_id,
                        duplicates = report.duplicates_removed.len(),
                        unknown_users = report.unknown_users_removed.len(),
                        count_before = report.count_before,
                        count_after = report.count_after,
                        linked = report.users_linked.len(),
                        unlinked = report.users_unlinked.len(),
                        "repaired roster"
                    );
                    return Ok(report);
                }
                Err(ModelError::ConcurrencyConflict { .. }) if attempt < MAX_COMMIT_ATTEMPTS => {
                    info!(relationship = R::NAME, parent_id, attempt, "reconcile raced a writer, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Lock keys for the parent and every user currently tied to it from
    /// either side.
    fn discover_keys<R: Relationship>(&self, parent_id: u64) -> Result<HashSet<String>, HubError> {
        let (parent, _) = self.load_parent::<R>(parent_id)?;

        let mut keys = HashSet::new();
        keys.insert(storage_key(<R::Parent as Model>::COLLECTION, parent_id));
        for id in R::members(&parent) {
            keys.insert(storage_key(User::COLLECTION, *id));
        }
        for versioned in self.referencing_users::<R>(parent_id)? {
            keys.insert(storage_key(User::COLLECTION, versioned.data.id));
        }

        Ok(keys)
    }

    fn referencing_users<R: Relationship>(&self, parent_id: u64) -> Result<Vec<Versioned<User>>, HubError> {
        Ok(self
            .store
            .find_models::<User>(&|user| R::reverse_index(user).contains(&parent_id))?)
    }

    fn plan_repair<R: Relationship>(&self, parent_id: u64) -> Result<Repair, HubError> {
        let (mut parent, parent_version) = self.load_parent::<R>(parent_id)?;
        let mut report = ReconcileReport {
            parent_id,
            count_before: R::count(&parent),
            ..ReconcileReport::default()
        };

        let mut users: BTreeMap<u64, Versioned<User>> = self
            .referencing_users::<R>(parent_id)?
            .into_iter()
            .map(|versioned| (versioned.data.id, versioned))
            .collect();

        let mut seen = HashSet::new();
        let mut roster = Vec::with_capacity(R::members(&parent).len());
        for id in R::members(&parent) {
            if !seen.insert(*id) {
                report.duplicates_removed.push(*id);
                continue;
            }
            if !users.contains_key(id) {
                match self.store.get_model::<User>(*id)? {
                    Some(versioned) => {
                        users.insert(*id, versioned);
                    }
                    None => {
                        report.unknown_users_removed.push(*id);
                        continue;
                    }
                }
            }
            roster.push(*id);
        }
        report.count_after = roster.len() as u64;

        let mut writes = Vec::new();
        if roster.as_slice() != R::members(&parent) || report.count_after != report.count_before {
            let fields = R::roster(&mut parent);
            *fields.members = roster.clone();
            *fields.count = report.count_after;
            writes.push(PendingWrite::update(&parent, parent_version)?);
        }

        for (id, versioned) in users.iter_mut() {
            let is_member = roster.contains(id);
            let index = R::reverse_index_mut(&mut versioned.data);
            let listed = index.iter().filter(|p| **p == parent_id).count();

            match (is_member, listed) {
                (true, 1) | (false, 0) => continue,
                (true, 0) => report.users_linked.push(*id),
                (false, _) => report.users_unlinked.push(*id),
                (true, _) => {}
            }

            index.retain(|p| *p != parent_id);
            if is_member {
                index.push(parent_id);
            }
            writes.push(PendingWrite::update(&versioned.data, versioned.version)?);
        }

        Ok(Repair {
            report,
            writes,
            touched_users: users.keys().copied().collect(),
        })
    }
}
