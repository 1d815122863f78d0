//! InMemoryModelStore - BTreeMap-backed model store for tests and local runs.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use tracing::warn;

use super::{Model, ModelError, ModelStore, PendingWrite, Versioned};

/// Internal stored representation of a model.
#[derive(Debug, Clone)]
pub(crate) struct StoredModel {
    pub(crate) bytes: Vec<u8>,
    pub(crate) version: u64,
}

/// The record table shared by the in-memory and JSON-file stores.
///
/// Keyed by `(collection, id)` so a collection is one contiguous range,
/// already ordered by id.
#[derive(Debug, Clone, Default)]
pub(crate) struct Records {
    entries: BTreeMap<(String, u64), StoredModel>,
}

impl Records {
    fn version(&self, collection: &str, id: u64) -> u64 {
        self.entries
            .get(&(collection.to_string(), id))
            .map(|stored| stored.version)
            .unwrap_or(0)
    }

    fn collection(&self, collection: &str) -> impl Iterator<Item = (&u64, &StoredModel)> {
        self.entries
            .range((collection.to_string(), 0)..=(collection.to_string(), u64::MAX))
            .map(|((_, id), stored)| (id, stored))
    }

    /// Overwrite a record and bump its version. Returns the new version.
    pub(crate) fn put_raw(&mut self, collection: &str, id: u64, bytes: Vec<u8>) -> u64 {
        let version = self.version(collection, id) + 1;
        self.entries
            .insert((collection.to_string(), id), StoredModel { bytes, version });
        version
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, u64, &StoredModel)> {
        self.entries
            .iter()
            .map(|((collection, id), stored)| (collection.as_str(), *id, stored))
    }

    pub(crate) fn get<M: Model>(&self, id: u64) -> Result<Option<Versioned<M>>, ModelError> {
        match self.entries.get(&(M::COLLECTION.to_string(), id)) {
            Some(stored) => {
                let data: M = serde_json::from_slice(&stored.bytes)
                    .map_err(|e| ModelError::Serde(e.to_string()))?;
                Ok(Some(Versioned {
                    data,
                    version: stored.version,
                }))
            }
            None => Ok(None),
        }
    }

    pub(crate) fn find<M: Model>(&self, predicate: &dyn Fn(&M) -> bool) -> Vec<Versioned<M>> {
        let mut results = Vec::new();

        for (id, stored) in self.collection(M::COLLECTION) {
            match serde_json::from_slice::<M>(&stored.bytes) {
                Ok(data) => {
                    if predicate(&data) {
                        results.push(Versioned {
                            data,
                            version: stored.version,
                        });
                    }
                }
                Err(e) => warn!(collection = M::COLLECTION, id, error = %e, "skipping unreadable record"),
            }
        }

        results
    }

    pub(crate) fn insert<M: Model>(&mut self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.commit(vec![PendingWrite::insert(model)?])?;
        Ok(Versioned {
            data: model.clone(),
            version: 1,
        })
    }

    pub(crate) fn update<M: Model>(
        &mut self,
        model: &M,
        expected_version: u64,
    ) -> Result<Versioned<M>, ModelError> {
        if self.version(M::COLLECTION, model.id()) == 0 {
            return Err(ModelError::NotFound {
                collection: M::COLLECTION.to_string(),
                id: model.id(),
            });
        }

        self.commit(vec![PendingWrite::update(model, expected_version)?])?;
        Ok(Versioned {
            data: model.clone(),
            version: expected_version + 1,
        })
    }

    pub(crate) fn save<M: Model>(&mut self, model: &M) -> Result<Versioned<M>, ModelError> {
        let bytes = serde_json::to_vec(model).map_err(|e| ModelError::Serde(e.to_string()))?;
        let version = self.put_raw(M::COLLECTION, model.id(), bytes);
        Ok(Versioned {
            data: model.clone(),
            version,
        })
    }

    pub(crate) fn commit(&mut self, writes: Vec<PendingWrite>) -> Result<(), ModelError> {
        for write in &writes {
            let actual = self.version(write.collection, write.id);
            if actual == write.expected_version {
                continue;
            }
            if write.expected_version == 0 {
                return Err(ModelError::AlreadyExists {
                    collection: write.collection.to_string(),
                    id: write.id,
                });
            }
            return Err(ModelError::ConcurrencyConflict {
                collection: write.collection.to_string(),
                id: write.id,
                expected: write.expected_version,
                actual,
            });
        }

        for write in writes {
            self.put_raw(write.collection, write.id, write.bytes);
        }

        Ok(())
    }

    pub(crate) fn next_id(&self, collection: &str) -> Result<u64, ModelError> {
        match self.collection(collection).map(|(id, _)| *id).last() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or_else(|| {
                ModelError::Storage(format!("no ids left in {} after {}", collection, max))
            }),
        }
    }
}

/// In-memory model store.
///
/// Clone-friendly via Arc: clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryModelStore {
    storage: Arc<RwLock<Records>>,
}

impl InMemoryModelStore {
    /// Create a new empty model store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Records>, ModelError> {
        self.storage
            .read()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Records>, ModelError> {
        self.storage
            .write()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))
    }
}

impl ModelStore for InMemoryModelStore {
    fn get_model<M: Model>(&self, id: u64) -> Result<Option<Versioned<M>>, ModelError> {
        self.read()?.get(id)
    }

    fn find_models<M: Model>(
        &self,
        predicate: &dyn Fn(&M) -> bool,
    ) -> Result<Vec<Versioned<M>>, ModelError> {
        Ok(self.read()?.find(predicate))
    }

    fn insert_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.write()?.insert(model)
    }

    fn update_model<M: Model>(
        &self,
        model: &M,
        expected_version: u64,
    ) -> Result<Versioned<M>, ModelError> {
        self.write()?.update(model, expected_version)
    }

    fn save_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.write()?.save(model)
    }

    fn commit(&self, writes: Vec<PendingWrite>) -> Result<(), ModelError> {
        self.write()?.commit(writes)
    }

    fn next_id<M: Model>(&self) -> Result<u64, ModelError> {
        self.read()?.next_id(M::COLLECTION)
    }
}
