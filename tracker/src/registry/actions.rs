//! Commands accepted by the registry and the outcomes it emits.

use crate::csv_import::{ImportReport, ParsedBatch};
use crate::error::TrackerError;
use crate::types::{Attendee, AttendeeDraft, AttendeePatch, Identifier};
use event_tracker_macros::Action;
use uuid::Uuid;

/// Registry actions.
///
/// Every command carries a `request_id`. The reducer answers each command
/// with exactly one event carrying the same id, so callers waiting in
/// `Store::send_and_wait_for` can pick out their own outcome.
#[derive(Action, Clone, Debug)]
pub enum RegistryAction {
    // Commands
    /// Register one attendee
    #[command]
    CreateAttendee {
        /// Correlation id
        request_id: Uuid,
        /// Unvalidated input
        draft: AttendeeDraft,
    },

    /// Apply a partial update
    #[command]
    UpdateAttendee {
        /// Correlation id
        request_id: Uuid,
        /// Target attendee
        identifier: Identifier,
        /// Fields to change
        patch: AttendeePatch,
    },

    /// Commit a parsed CSV upload
    #[command]
    ImportBatch {
        /// Correlation id
        request_id: Uuid,
        /// Rows already validated in isolation
        batch: ParsedBatch,
    },

    /// Replace the registry with records loaded from a snapshot
    #[command]
    Restore {
        /// Correlation id
        request_id: Uuid,
        /// Snapshot contents
        attendees: Vec<Attendee>,
    },

    // Events
    /// An attendee was registered
    #[event]
    AttendeeCreated {
        /// Correlation id
        request_id: Uuid,
        /// The stored record
        attendee: Attendee,
    },

    /// An attendee was updated
    #[event]
    AttendeeUpdated {
        /// Correlation id
        request_id: Uuid,
        /// The stored record after the update
        attendee: Attendee,
    },

    /// A CSV batch was committed
    #[event]
    BatchImported {
        /// Correlation id
        request_id: Uuid,
        /// What was added and what was skipped
        report: ImportReport,
    },

    /// The registry was rebuilt from a snapshot
    #[event]
    Restored {
        /// Correlation id
        request_id: Uuid,
        /// Records now in the registry
        restored: usize,
        /// Records dropped as duplicates
        dropped: usize,
    },

    /// A command was refused; state is unchanged
    #[event]
    CommandRejected {
        /// Correlation id
        request_id: Uuid,
        /// Why
        error: TrackerError,
    },
}

impl RegistryAction {
    /// Whether this is the outcome of the command sent with `request_id`.
    #[must_use]
    pub fn is_outcome_for(&self, request_id: &Uuid) -> bool {
        self.is_event() && self.request_id() == Some(request_id)
    }
}
