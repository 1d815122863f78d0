//! Models - Typed records kept in a collection-keyed document store.
//!
//! Every persisted record (courses, events, groups, users) is a `Model`:
//! a serde type with a collection name and an integer id. Stores hand out
//! `Versioned` copies; writes that carry the version they were read at are
//! rejected if someone else wrote in between.
//!
//! ## Example
//!
//! ```ignore
//! use campus_hub::{InMemoryModelStore, ModelsExt, PendingWrite};
//!
//! let store = InMemoryModelStore::new();
//! store.models::<Course>().insert(&course)?;
//!
//! let loaded = store.models::<Course>().get(5)?.unwrap();
//! store.commit(vec![PendingWrite::update(&loaded.data, loaded.version)?])?;
//! ```

mod in_memory;
mod json_file;
mod model_repository;
mod store;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Trait for types that can be stored as models.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection name for this model type (e.g., "courses", "users").
    /// Maps to a collection in a document database or a top-level key in the
    /// JSON fallback file.
    const COLLECTION: &'static str;

    /// Returns the unique integer identifier for this model instance.
    fn id(&self) -> u64;
}

/// A versioned wrapper around model data for optimistic concurrency control.
///
/// Versions start at 1 for the first write and grow by one per write.
/// Version 0 means "does not exist".
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub data: T,
    pub version: u64,
}

/// One serialized write, queued for an all-or-nothing `ModelStore::commit`.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub(crate) collection: &'static str,
    pub(crate) id: u64,
    pub(crate) bytes: Vec<u8>,
    pub(crate) expected_version: u64,
}

impl PendingWrite {
    /// Write `model` only if the stored copy is still at `expected_version`.
    pub fn update<M: Model>(model: &M, expected_version: u64) -> Result<Self, ModelError> {
        Ok(Self {
            collection: M::COLLECTION,
            id: model.id(),
            bytes: serde_json::to_vec(model).map_err(|e| ModelError::Serde(e.to_string()))?,
            expected_version,
        })
    }

    /// Write `model` only if no record with its id exists yet.
    pub fn insert<M: Model>(model: &M) -> Result<Self, ModelError> {
        Self::update(model, 0)
    }
}

/// Error type for model store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on {collection}:{id} (expected version {expected}, actual {actual})")]
    ConcurrencyConflict {
        collection: String,
        id: u64,
        expected: u64,
        actual: u64,
    },
    /// Insert of an id that is already taken.
    #[error("model already exists: {collection}:{id}")]
    AlreadyExists { collection: String, id: u64 },
    /// Serialization/deserialization error.
    #[error("model serialization error: {0}")]
    Serde(String),
    /// Storage-level error.
    #[error("model storage error: {0}")]
    Storage(String),
    /// Model not found.
    #[error("model not found: {collection}:{id}")]
    NotFound { collection: String, id: u64 },
}

/// Key naming one record, e.g. `"courses:5"`; also used as its lock key.
pub(crate) fn storage_key(collection: &str, id: u64) -> String {
    format!("{}:{}", collection, id)
}

pub use in_memory::InMemoryModelStore;
pub use json_file::JsonFileModelStore;
pub use model_repository::{ModelRepository, ModelsExt};
pub use store::ModelStore;
