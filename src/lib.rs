//! campus_hub: course catalog, events and groups with consistent rosters.
//!
//! Users enroll in courses, register for events and join groups. Each of
//! those memberships is stored on both records involved; the
//! [`RosterService`] is the single place that changes them and keeps the two
//! sides in agreement. Records live in any [`ModelStore`]: in memory, or in
//! the JSON file fallback.

mod catalog;
mod config;
mod entities;
mod error;
mod lock;
mod model;
mod roster;

#[cfg(feature = "http")]
pub mod http;

pub use catalog::{Catalog, CatalogEntry, CourseDraft, Draft, EventDraft, GroupDraft, UserDraft};
pub use config::{Config, ConfigError};
pub use entities::{Course, Event, Group, User};
pub use error::HubError;
pub use lock::{InMemoryLock, InMemoryLockManager, Lock, LockError, LockGuard, LockManager};
pub use model::{
    InMemoryModelStore, JsonFileModelStore, Model, ModelError, ModelRepository, ModelStore,
    ModelsExt, PendingWrite, Versioned,
};
pub use roster::{
    id_field, Enrollment, GroupMembership, MembershipRequest, Messages, ReconcileReport,
    Registration, Relationship, RosterFields, RosterService,
};
