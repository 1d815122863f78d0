//! Random join/leave sequences against a plain set-based model.

use std::collections::BTreeSet;

use campus_hub::{Event, HubError, Registration, User};
use proptest::prelude::*;

use crate::support::{event, insert, load, service, users};

const EVENTS: u64 = 3;
const USERS: u64 = 5;
const CAPACITY: u64 = 3;

#[derive(Debug, Clone)]
enum Op {
    Join { event: u64, user: u64 },
    Leave { event: u64, user: u64 },
}

fn op() -> impl Strategy<Value = Op> {
    (any::<bool>(), 1..=EVENTS, 1..=USERS).prop_map(|(join, event, user)| {
        if join {
            Op::Join { event, user }
        } else {
            Op::Leave { event, user }
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn rosters_match_reference(ops in prop::collection::vec(op(), 1..60)) {
        let roster = service();
        let store = roster.store();
        for id in 1..=EVENTS {
            // Event 1 is unlimited, the rest share a small cap.
            let max = if id == 1 { None } else { Some(CAPACITY) };
            insert(store, event(id, max));
        }
        users(store, USERS);

        let mut expected: Vec<BTreeSet<u64>> = vec![BTreeSet::new(); EVENTS as usize + 1];

        for op in &ops {
            match *op {
                Op::Join { event, user } => {
                    let members = &mut expected[event as usize];
                    let full = event != 1 && members.len() as u64 >= CAPACITY;
                    let result = roster.join::<Registration>(event, user);
                    if full {
                        prop_assert_eq!(result, Err(HubError::Capacity("Event is full".into())));
                    } else if members.contains(&user) {
                        prop_assert!(matches!(result, Err(HubError::Conflict(_))));
                    } else {
                        prop_assert!(result.is_ok());
                        members.insert(user);
                    }
                }
                Op::Leave { event, user } => {
                    let members = &mut expected[event as usize];
                    let result = roster.leave::<Registration>(event, user);
                    if members.remove(&user) {
                        prop_assert!(result.is_ok());
                    } else {
                        prop_assert!(matches!(result, Err(HubError::Conflict(_))));
                    }
                }
            }
        }

        for event_id in 1..=EVENTS {
            let stored = load::<_, Event>(store, event_id);
            let as_set: BTreeSet<u64> = stored.attendees.iter().copied().collect();

            // No duplicates, count matches, roster matches the model.
            prop_assert_eq!(as_set.len(), stored.attendees.len());
            prop_assert_eq!(stored.attendee_count, stored.attendees.len() as u64);
            prop_assert_eq!(&as_set, &expected[event_id as usize]);
            if let Some(max) = stored.max_attendees {
                prop_assert!(stored.attendee_count <= max);
            }

            for user_id in 1..=USERS {
                let user = load::<_, User>(store, user_id);
                prop_assert_eq!(
                    as_set.contains(&user_id),
                    user.saved_events.contains(&event_id)
                );
            }
        }
    }
}
