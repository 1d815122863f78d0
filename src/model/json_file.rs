//! JsonFileModelStore - the local JSON-file fallback.
//!
//! The whole store lives in one JSON document shaped like
//!
//! ```json
//! {
//!   "courses": [ { "id": 1, "title": "Rust 101", ... } ],
//!   "users":   [ { "id": 12, "name": "Ada", ... } ]
//! }
//! ```
//!
//! Records are kept in memory and the file is rewritten after every
//! successful write: the new document goes to `<path>.tmp` and is renamed
//! over the original, so a crash leaves either the old or the new file.
//! A write whose flush fails is not applied in memory either.
//!
//! Versions are not persisted; every record loads at version 1.

use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, info};

use super::in_memory::Records;
use super::{Model, ModelError, ModelStore, PendingWrite, Versioned};

/// Model store persisted to a single JSON file.
///
/// Clones share the same records and file.
#[derive(Debug, Clone)]
pub struct JsonFileModelStore {
    path: Arc<PathBuf>,
    storage: Arc<RwLock<Records>>,
}

impl JsonFileModelStore {
    /// Open the store at `path`, loading existing records.
    ///
    /// A missing file is an empty store; the file is created on first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref().to_path_buf();

        let records = if path.exists() {
            let bytes = fs::read(&path)
                .map_err(|e| ModelError::Storage(format!("read {}: {}", path.display(), e)))?;
            let records = records_from_document(&bytes)?;
            info!(path = %path.display(), records = records.iter().count(), "loaded data file");
            records
        } else {
            info!(path = %path.display(), "data file not found, starting empty");
            Records::default()
        };

        Ok(Self {
            path: Arc::new(path),
            storage: Arc::new(RwLock::new(records)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current records to disk even if nothing changed.
    pub fn flush(&self) -> Result<(), ModelError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))?;
        persist(&self.path, &storage)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Records>, ModelError> {
        self.storage
            .read()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))
    }

    /// Run `op` against a copy of the records, flush the copy, then swap it in.
    fn write<T>(
        &self,
        op: impl FnOnce(&mut Records) -> Result<T, ModelError>,
    ) -> Result<T, ModelError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))?;

        let mut next = storage.clone();
        let result = op(&mut next)?;
        persist(&self.path, &next)?;
        *storage = next;

        Ok(result)
    }
}

impl ModelStore for JsonFileModelStore {
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
        self.write(|records| records.insert(model))
    }

    fn update_model<M: Model>(
        &self,
        model: &M,
        expected_version: u64,
    ) -> Result<Versioned<M>, ModelError> {
        self.write(|records| records.update(model, expected_version))
    }

    fn save_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.write(|records| records.save(model))
    }

    fn commit(&self, writes: Vec<PendingWrite>) -> Result<(), ModelError> {
        self.write(|records| records.commit(writes))
    }

    fn next_id<M: Model>(&self) -> Result<u64, ModelError> {
        self.read()?.next_id(M::COLLECTION)
    }
}

fn records_from_document(bytes: &[u8]) -> Result<Records, ModelError> {
    let document: BTreeMap<String, Vec<Value>> = serde_json::from_slice(bytes)
        .map_err(|e| ModelError::Storage(format!("malformed data file: {}", e)))?;

    let mut records = Records::default();
    for (collection, items) in document {
        let mut seen = HashSet::new();
        for item in items {
            let id = item.get("id").and_then(Value::as_u64).ok_or_else(|| {
                ModelError::Storage(format!("record in {} has no integer id", collection))
            })?;
            if !seen.insert(id) {
                return Err(ModelError::Storage(format!(
                    "duplicate id {} in {}",
                    id, collection
                )));
            }
            let bytes = serde_json::to_vec(&item).map_err(|e| ModelError::Serde(e.to_string()))?;
            records.put_raw(&collection, id, bytes);
        }
    }

    Ok(records)
}

fn records_to_document(records: &Records) -> Result<BTreeMap<&str, Vec<Value>>, ModelError> {
    let mut document: BTreeMap<&str, Vec<Value>> = BTreeMap::new();
    for (collection, _, stored) in records.iter() {
        let value: Value =
            serde_json::from_slice(&stored.bytes).map_err(|e| ModelError::Serde(e.to_string()))?;
        document.entry(collection).or_default().push(value);
    }
    Ok(document)
}

fn persist(path: &Path, records: &Records) -> Result<(), ModelError> {
    let document = records_to_document(records)?;
    let bytes =
        serde_json::to_vec_pretty(&document).map_err(|e| ModelError::Serde(e.to_string()))?;

    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, &bytes)
        .map_err(|e| ModelError::Storage(format!("write {}: {}", tmp.display(), e)))?;
    fs::rename(&tmp, path)
        .map_err(|e| ModelError::Storage(format!("rename to {}: {}", path.display(), e)))?;

    debug!(path = %path.display(), bytes = bytes.len(), "data file flushed");
    Ok(())
}
