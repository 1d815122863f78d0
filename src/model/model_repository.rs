//! Typed access to one collection of a `ModelStore`.

use std::marker::PhantomData;

use super::{Model, ModelError, ModelStore, Versioned};

/// One collection of `store`, viewed as records of type `M`.
///
/// Borrowed from the store via [`ModelsExt::models`]; it holds nothing of
/// its own.
pub struct ModelRepository<'a, S, M> {
    store: &'a S,
    _collection: PhantomData<fn() -> M>,
}

impl<'a, S: ModelStore, M: Model> ModelRepository<'a, S, M> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _collection: PhantomData,
        }
    }

    /// The record with its version, if present.
    pub fn get(&self, id: u64) -> Result<Option<Versioned<M>>, ModelError> {
        self.store.get_model(id)
    }

    /// The record without its version, if present.
    pub fn load(&self, id: u64) -> Result<Option<M>, ModelError> {
        Ok(self.get(id)?.map(|versioned| versioned.data))
    }

    pub fn insert(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.store.insert_model(model)
    }

    pub fn update(&self, model: &M, expected_version: u64) -> Result<Versioned<M>, ModelError> {
        self.store.update_model(model, expected_version)
    }

    /// Unconditional overwrite. Skips the version check, so a concurrent
    /// writer's change can be lost; roster code never uses it.
    pub fn save(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.store.save_model(model)
    }

    /// Records matching `predicate`, ordered by id.
    pub fn find(&self, predicate: &dyn Fn(&M) -> bool) -> Result<Vec<Versioned<M>>, ModelError> {
        self.store.find_models(predicate)
    }

    /// Every record of the collection, ordered by id.
    pub fn all(&self) -> Result<Vec<M>, ModelError> {
        Ok(self
            .find(&|_| true)?
            .into_iter()
            .map(|versioned| versioned.data)
            .collect())
    }

    pub fn next_id(&self) -> Result<u64, ModelError> {
        self.store.next_id::<M>()
    }
}

/// `store.models::<Course>()` on any `ModelStore`.
pub trait ModelsExt: ModelStore + Sized {
    fn models<M: Model>(&self) -> ModelRepository<'_, Self, M> {
        ModelRepository::new(self)
    }
}

impl<S: ModelStore> ModelsExt for S {}
