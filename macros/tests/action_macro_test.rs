//! Tests for #[derive(Action)] macro

use event_tracker_macros::Action;
use uuid::Uuid;

#[derive(Action, Clone, Debug, PartialEq)]
#[allow(dead_code)]
enum CheckInAction {
    #[command]
    MarkRegistered { request_id: Uuid, identifier: String },

    #[command]
    Reset,

    #[event]
    Registered { request_id: Uuid, identifier: String },

    #[event]
    Rejected { request_id: Uuid, reason: String },

    #[event]
    SnapshotRestored(usize),

    Untagged { identifier: String },
}

#[test]
fn test_is_command() {
    let action = CheckInAction::MarkRegistered {
        request_id: Uuid::new_v4(),
        identifier: "A1".to_string(),
    };
    assert!(action.is_command());
    assert!(!action.is_event());
    assert!(CheckInAction::Reset.is_command());
}

#[test]
fn test_is_event() {
    let action = CheckInAction::Registered {
        request_id: Uuid::new_v4(),
        identifier: "A1".to_string(),
    };
    assert!(!action.is_command());
    assert!(action.is_event());
    assert!(CheckInAction::SnapshotRestored(3).is_event());
}

#[test]
fn test_event_type() {
    let action = CheckInAction::Rejected {
        request_id: Uuid::new_v4(),
        reason: "not found".to_string(),
    };
    assert_eq!(action.event_type(), "Rejected.v1");
    assert_eq!(CheckInAction::Reset.event_type(), "unknown");
}

#[test]
fn test_request_id_extracted_from_named_variants() {
    let id = Uuid::new_v4();
    let command = CheckInAction::MarkRegistered {
        request_id: id,
        identifier: "A1".to_string(),
    };
    let outcome = CheckInAction::Rejected {
        request_id: id,
        reason: "gone".to_string(),
    };

    assert_eq!(command.request_id(), Some(&id));
    assert_eq!(outcome.request_id(), Some(&id));
}

#[test]
fn test_request_id_absent_without_field() {
    assert_eq!(CheckInAction::Reset.request_id(), None);
    assert_eq!(CheckInAction::SnapshotRestored(1).request_id(), None);
    let untagged = CheckInAction::Untagged {
        identifier: "A1".to_string(),
    };
    assert_eq!(untagged.request_id(), None);
    assert!(!untagged.is_command());
    assert!(!untagged.is_event());
}
