//! ModelStore - Abstract persistence for models.

use super::{Model, ModelError, PendingWrite, Versioned};

/// Abstract document storage for models, keyed by collection and integer id.
///
/// This is the seam between the domain services and whatever actually holds
/// the records. All methods are blocking.
pub trait ModelStore: Send + Sync {
    /// Get a model by ID. Returns None if not found.
    fn get_model<M: Model>(&self, id: u64) -> Result<Option<Versioned<M>>, ModelError>;

    /// Find models matching a predicate, ordered by id.
    fn find_models<M: Model>(
        &self,
        predicate: &dyn Fn(&M) -> bool,
    ) -> Result<Vec<Versioned<M>>, ModelError>;

    /// Insert a new model. Fails with `AlreadyExists` if the id is taken.
    fn insert_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError>;

    /// Update an existing model with optimistic concurrency control.
    fn update_model<M: Model>(
        &self,
        model: &M,
        expected_version: u64,
    ) -> Result<Versioned<M>, ModelError>;

    /// Upsert a model (insert or update, no version check).
    fn save_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError>;

    /// Apply several writes as one unit.
    ///
    /// Every write's expected version is checked before anything is written;
    /// on the first mismatch nothing is applied and the conflict is returned.
    fn commit(&self, writes: Vec<PendingWrite>) -> Result<(), ModelError>;

    /// Next free id in the collection: `max(existing id) + 1`, or 1 when empty.
    fn next_id<M: Model>(&self) -> Result<u64, ModelError>;
}
