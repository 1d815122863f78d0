use campus_hub::{Enrollment, Group, GroupMembership, HubError, Registration, User};

use crate::support::{course, event, group, insert, load, service, user};

#[test]
fn private_groups_join_immediately() {
    let roster = service();
    let store = roster.store();
    insert(
        store,
        Group {
            is_private: true,
            ..group(3)
        },
    );
    insert(store, user(1));

    let group = roster.join::<GroupMembership>(3, 1).unwrap();
    assert!(group.is_private);
    assert_eq!(group.members, vec![1]);
    assert_eq!(group.member_count, 1);
    assert_eq!(load::<_, User>(store, 1).joined_groups, vec![3]);
}

#[test]
fn group_messages() {
    let roster = service();
    let store = roster.store();
    insert(store, group(3));
    insert(store, user(1));

    roster.join::<GroupMembership>(3, 1).unwrap();
    assert_eq!(
        roster.join::<GroupMembership>(3, 1).unwrap_err(),
        HubError::Conflict("User is already a member of this group".into())
    );
    roster.leave::<GroupMembership>(3, 1).unwrap();
    assert_eq!(
        roster.leave::<GroupMembership>(3, 1).unwrap_err(),
        HubError::Conflict("User is not a member of this group".into())
    );
    assert_eq!(
        roster.join::<GroupMembership>(4, 1).unwrap_err(),
        HubError::NotFound("Group not found".into())
    );
}

#[test]
fn relationships_touch_only_their_own_fields() {
    let roster = service();
    let store = roster.store();
    insert(store, course(1));
    insert(store, event(1, None));
    insert(store, group(1));
    insert(store, user(1));

    roster.join::<Enrollment>(1, 1).unwrap();
    let user = load::<_, User>(store, 1);
    assert_eq!(user.enrolled_courses, vec![1]);
    assert!(user.saved_events.is_empty());
    assert!(user.joined_groups.is_empty());

    roster.join::<GroupMembership>(1, 1).unwrap();
    roster.join::<Registration>(1, 1).unwrap();
    roster.leave::<Enrollment>(1, 1).unwrap();

    let user = load::<_, User>(store, 1);
    assert!(user.enrolled_courses.is_empty());
    assert_eq!(user.saved_events, vec![1]);
    assert_eq!(user.joined_groups, vec![1]);
}

#[test]
fn memberships_skip_dangling_ids() {
    let roster = service();
    let store = roster.store();
    insert(store, group(2));
    insert(
        store,
        User {
            joined_groups: vec![2, 99],
            ..user(1)
        },
    );

    let groups = roster.memberships::<GroupMembership>(1).unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, 2);

    assert_eq!(
        roster.memberships::<GroupMembership>(42).unwrap_err(),
        HubError::NotFound("User not found".into())
    );
}
