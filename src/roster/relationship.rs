//! The three membership relationships and the descriptor trait they share.

use crate::entities::{Course, Event, Group, User};
use crate::model::Model;

/// Mutable view of a parent's roster: the member ids and the cached count.
pub struct RosterFields<'a> {
    pub members: &'a mut Vec<u64>,
    pub count: &'a mut u64,
}

/// Caller-facing messages for one relationship.
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub parent_not_found: &'static str,
    pub already_member: &'static str,
    pub not_member: &'static str,
    pub full: &'static str,
}

/// Describes one user↔parent relationship: which parent type it joins, where
/// the roster lives on the parent and where the reverse index lives on the
/// user.
///
/// `RosterService` implements join/leave once against this trait; the three
/// relationships are zero-sized descriptors.
pub trait Relationship: Send + Sync + 'static {
    type Parent: Model;

    /// Short name used in logs and routes (`"enroll"`).
    const NAME: &'static str;

    /// Request field carrying the parent id (`"courseId"`).
    const PARENT_FIELD: &'static str;

    const MESSAGES: Messages;

    fn members(parent: &Self::Parent) -> &[u64];

    fn count(parent: &Self::Parent) -> u64;

    fn roster(parent: &mut Self::Parent) -> RosterFields<'_>;

    fn reverse_index(user: &User) -> &[u64];

    fn reverse_index_mut(user: &mut User) -> &mut Vec<u64>;

    /// Maximum roster size, if the parent has one.
    fn capacity(_parent: &Self::Parent) -> Option<u64> {
        None
    }
}

/// user ↔ course (`enrolledStudents` / `enrolledCourses`).
pub struct Enrollment;

impl Relationship for Enrollment {
    type Parent = Course;

    const NAME: &'static str = "enroll";
    const PARENT_FIELD: &'static str = "courseId";
    const MESSAGES: Messages = Messages {
        parent_not_found: "Course not found",
        already_member: "User is already enrolled in this course",
        not_member: "User is not enrolled in this course",
        full: "Course is full",
    };

    fn members(course: &Course) -> &[u64] {
        &course.enrolled_students
    }

    fn count(course: &Course) -> u64 {
        course.enrollment_count
    }

    fn roster(course: &mut Course) -> RosterFields<'_> {
        RosterFields {
            members: &mut course.enrolled_students,
            count: &mut course.enrollment_count,
        }
    }

    fn reverse_index(user: &User) -> &[u64] {
        &user.enrolled_courses
    }

    fn reverse_index_mut(user: &mut User) -> &mut Vec<u64> {
        &mut user.enrolled_courses
    }
}

/// user ↔ event (`attendees` / `savedEvents`), capped by `maxAttendees`.
pub struct Registration;

impl Relationship for Registration {
    type Parent = Event;

    const NAME: &'static str = "register";
    const PARENT_FIELD: &'static str = "eventId";
    const MESSAGES: Messages = Messages {
        parent_not_found: "Event not found",
        already_member: "User is already registered for this event",
        not_member: "User is not registered for this event",
        full: "Event is full",
    };

    fn members(event: &Event) -> &[u64] {
        &event.attendees
    }

    fn count(event: &Event) -> u64 {
        event.attendee_count
    }

    fn roster(event: &mut Event) -> RosterFields<'_> {
        RosterFields {
            members: &mut event.attendees,
            count: &mut event.attendee_count,
        }
    }

    fn reverse_index(user: &User) -> &[u64] {
        &user.saved_events
    }

    fn reverse_index_mut(user: &mut User) -> &mut Vec<u64> {
        &mut user.saved_events
    }

    fn capacity(event: &Event) -> Option<u64> {
        event.max_attendees
    }
}

/// user ↔ group (`members` / `joinedGroups`).
pub struct GroupMembership;

impl Relationship for GroupMembership {
    type Parent = Group;

    const NAME: &'static str = "join";
    const PARENT_FIELD: &'static str = "groupId";
    const MESSAGES: Messages = Messages {
        parent_not_found: "Group not found",
        already_member: "User is already a member of this group",
        not_member: "User is not a member of this group",
        full: "Group is full",
    };

    fn members(group: &Group) -> &[u64] {
        &group.members
    }

    fn count(group: &Group) -> u64 {
        group.member_count
    }

    fn roster(group: &mut Group) -> RosterFields<'_> {
        RosterFields {
            members: &mut group.members,
            count: &mut group.member_count,
        }
    }

    fn reverse_index(user: &User) -> &[u64] {
        &user.joined_groups
    }

    fn reverse_index_mut(user: &mut User) -> &mut Vec<u64> {
        &mut user.joined_groups
    }
}
