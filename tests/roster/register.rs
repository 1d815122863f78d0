use campus_hub::{Event, HubError, Registration, User};

use crate::support::{event, insert, load, service, users};

#[test]
fn third_registration_hits_capacity() {
    let roster = service();
    let store = roster.store();
    insert(store, event(1, Some(2)));
    users(store, 3);

    roster.join::<Registration>(1, 1).unwrap();
    let full = roster.join::<Registration>(1, 2).unwrap();
    assert_eq!(full.attendees, vec![1, 2]);
    assert_eq!(full.attendee_count, 2);

    let err = roster.join::<Registration>(1, 3).unwrap_err();
    assert_eq!(err, HubError::Capacity("Event is full".into()));
    assert_eq!(err.status_code(), 400);

    assert_eq!(load::<_, Event>(store, 1), full);
    assert!(load::<_, User>(store, 3).saved_events.is_empty());
}

#[test]
fn capacity_is_checked_before_membership() {
    let roster = service();
    let store = roster.store();
    insert(store, event(1, Some(1)));
    users(store, 1);

    roster.join::<Registration>(1, 1).unwrap();
    let err = roster.join::<Registration>(1, 1).unwrap_err();
    assert_eq!(err, HubError::Capacity("Event is full".into()));
}

#[test]
fn leaving_frees_a_seat() {
    let roster = service();
    let store = roster.store();
    insert(store, event(1, Some(1)));
    users(store, 2);

    roster.join::<Registration>(1, 1).unwrap();
    assert!(roster.join::<Registration>(1, 2).is_err());

    roster.leave::<Registration>(1, 1).unwrap();
    let event = roster.join::<Registration>(1, 2).unwrap();
    assert_eq!(event.attendees, vec![2]);
    assert_eq!(load::<_, User>(store, 2).saved_events, vec![1]);
}

#[test]
fn unlimited_event_takes_everyone() {
    let roster = service();
    let store = roster.store();
    insert(store, event(1, None));
    users(store, 25);

    for id in 1..=25 {
        roster.join::<Registration>(1, id).unwrap();
    }
    assert_eq!(load::<_, Event>(store, 1).attendee_count, 25);
}

#[test]
fn registration_messages() {
    let roster = service();
    let store = roster.store();
    insert(store, event(1, None));
    users(store, 1);

    assert_eq!(
        roster.join::<Registration>(2, 1).unwrap_err(),
        HubError::NotFound("Event not found".into())
    );
    assert_eq!(
        roster.leave::<Registration>(1, 1).unwrap_err(),
        HubError::Conflict("User is not registered for this event".into())
    );
    roster.join::<Registration>(1, 1).unwrap();
    assert_eq!(
        roster.join::<Registration>(1, 1).unwrap_err(),
        HubError::Conflict("User is already registered for this event".into())
    );
}
