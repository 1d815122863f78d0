//! Rosters: two-sided membership between users and courses, events and groups.
//!
//! A membership is recorded twice: the parent keeps a roster of user ids and
//! a cached count, the user keeps a reverse index of parent ids. The
//! `RosterService` is the only writer of either side and keeps them equal:
//!
//! - a user is on the roster exactly when the parent is in the user's index;
//! - the count equals the roster length;
//! - a user appears on a roster at most once (a second join is an error);
//! - an event never holds more attendees than `maxAttendees`.
//!
//! ## Example
//!
//! ```ignore
//! use campus_hub::{Enrollment, InMemoryModelStore, RosterService};
//!
//! let roster = RosterService::new(InMemoryModelStore::new());
//! let course = roster.join::<Enrollment>(5, 12)?;
//! assert!(course.enrolled_students.contains(&12));
//!
//! roster.leave::<Enrollment>(5, 12)?;
//! ```

mod reconcile;
mod relationship;
mod request;
mod service;

pub use reconcile::ReconcileReport;
pub use relationship::{
    Enrollment, GroupMembership, Messages, Registration, Relationship, RosterFields,
};
pub use request::{id_field, MembershipRequest};
pub use service::RosterService;
