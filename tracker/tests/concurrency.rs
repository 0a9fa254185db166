//! Concurrent commands against one registry.

#![allow(clippy::unwrap_used)]

use event_tracker::registry::{
    RegistryEnvironment, RegistryHandle, RegistryReducer, RegistryState, RegistryStore,
};
use event_tracker::types::{AttendeeDraft, AttendeePatch, Identifier, StatusFlag};
use event_tracker::TrackerError;
use event_tracker_runtime::StoreConfig;
use event_tracker_testing::mocks::{test_clock, SequentialIdGenerator};
use std::sync::Arc;
use std::time::Duration;

fn registry() -> RegistryHandle {
    let environment = RegistryEnvironment::new(
        Arc::new(test_clock()),
        Arc::new(SequentialIdGenerator::new()),
    );
    let store = Arc::new(RegistryStore::with_config(
        RegistryState::default(),
        RegistryReducer::new(),
        environment,
        StoreConfig::default().with_broadcast_capacity(1024),
    ));
    RegistryHandle::new(store, Duration::from_secs(10))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_are_never_lost() {
    let registry = registry();
    let attendee = registry
        .create(AttendeeDraft {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            role: None,
            phone_number: None,
        })
        .await
        .unwrap();

    let toggles = 51;
    let tasks: Vec<_> = (0..toggles)
        .map(|_| {
            let registry = registry.clone();
            let identifier = attendee.identifier.clone();
            tokio::spawn(async move {
                registry
                    .update(
                        identifier,
                        AttendeePatch {
                            toggle: vec![StatusFlag::LunchCollected],
                            ..AttendeePatch::default()
                        },
                    )
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // An odd number of flips ends on `true`
    let stored = registry.get(attendee.identifier.as_str()).await.unwrap();
    assert!(stored.lunch_collected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mixed_field_updates_all_land() {
    let registry = registry();
    let attendee = registry
        .create(AttendeeDraft {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            role: None,
            phone_number: None,
        })
        .await
        .unwrap();

    // Nine lunch toggles and four kit toggles, with field edits mixed in
    let patches: Vec<AttendeePatch> = (0..12)
        .map(|i| {
            let mut patch = AttendeePatch::default();
            if i % 4 != 3 {
                patch.toggle.push(StatusFlag::LunchCollected);
            }
            if i % 3 == 0 {
                patch.toggle.push(StatusFlag::KitCollected);
            }
            match i {
                0 => patch.name = Some("Ada King".to_string()),
                5 => patch.role = Some("speaker".to_string()),
                7 => patch.phone_number = Some("555-0100".to_string()),
                10 => patch.registered = Some(true),
                _ => {},
            }
            patch
        })
        .collect();

    let tasks: Vec<_> = patches
        .into_iter()
        .map(|patch| {
            let registry = registry.clone();
            let identifier = attendee.identifier.clone();
            tokio::spawn(async move { registry.update(identifier, patch).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stored = registry.get(attendee.identifier.as_str()).await.unwrap();
    assert_eq!(stored.name, "Ada King");
    assert_eq!(stored.role.as_deref(), Some("speaker"));
    assert_eq!(stored.phone_number.as_deref(), Some("555-0100"));
    assert!(stored.registered);
    assert!(stored.checked_in_at.is_some());
    assert!(stored.lunch_collected);
    assert!(!stored.kit_collected);
    assert_eq!(stored.email, attendee.email);
    assert_eq!(stored.registration_time, attendee.registration_time);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_with_one_email_admit_exactly_one() {
    let registry = registry();

    let tasks: Vec<_> = (0..20)
        .map(|n| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .create(AttendeeDraft {
                        name: format!("Racer {n}"),
                        email: if n % 2 == 0 {
                            "race@example.com".to_string()
                        } else {
                            "RACE@example.com ".to_string()
                        },
                        role: None,
                        phone_number: None,
                    })
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(err) => assert!(
                matches!(err, TrackerError::EmailConflict { .. }),
                "unexpected error: {err}"
            ),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(registry.count_by_flags().await.total, 1);
}

#[tokio::test]
async fn updates_to_unknown_attendees_fail_cleanly() {
    let registry = registry();
    let result = registry
        .update(Identifier::new("MISSING"), AttendeePatch::default())
        .await;
    assert!(matches!(result, Err(TrackerError::NotFound { .. })));
}
