//! Request/response facade over the registry store.

use super::actions::RegistryAction;
use super::environment::RegistryEnvironment;
use super::reducer::RegistryReducer;
use super::state::RegistryState;
use crate::csv_import::{ImportReport, ParsedBatch};
use crate::error::TrackerError;
use crate::stats::{Stats, StatsReport};
use crate::types::{Attendee, AttendeeDraft, AttendeePatch, Identifier, Page};
use event_tracker_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// The store type backing the registry.
pub type RegistryStore = Store<RegistryState, RegistryAction, RegistryEnvironment, RegistryReducer>;

/// Cloneable handle used by HTTP handlers and background tasks.
///
/// Mutations go through the store as commands and wait for their correlated
/// outcome. Reads take the store's read lock directly.
#[derive(Clone)]
pub struct RegistryHandle {
    store: Arc<RegistryStore>,
    timeout: Duration,
}

impl RegistryHandle {
    /// Wrap a store; `timeout` bounds how long a command waits for its outcome.
    #[must_use]
    pub const fn new(store: Arc<RegistryStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// The underlying store, for health checks and shutdown.
    #[must_use]
    pub const fn store(&self) -> &Arc<RegistryStore> {
        &self.store
    }

    /// Register a new attendee.
    ///
    /// # Errors
    ///
    /// [`TrackerError::InvalidArgument`], [`TrackerError::EmailConflict`],
    /// [`TrackerError::IdentifierExhausted`], or a store failure.
    pub async fn create(&self, draft: AttendeeDraft) -> Result<Attendee, TrackerError> {
        let request_id = Uuid::new_v4();
        match self
            .dispatch(request_id, RegistryAction::CreateAttendee { request_id, draft })
            .await?
        {
            RegistryAction::AttendeeCreated { attendee, .. } => Ok(attendee),
            other => Err(unexpected(&other)),
        }
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NotFound`], [`TrackerError::InvalidArgument`],
    /// [`TrackerError::EmailConflict`], or a store failure.
    pub async fn update(
        &self,
        identifier: Identifier,
        patch: AttendeePatch,
    ) -> Result<Attendee, TrackerError> {
        let request_id = Uuid::new_v4();
        let command = RegistryAction::UpdateAttendee {
            request_id,
            identifier,
            patch,
        };
        match self.dispatch(request_id, command).await? {
            RegistryAction::AttendeeUpdated { attendee, .. } => Ok(attendee),
            other => Err(unexpected(&other)),
        }
    }

    /// Commit a parsed CSV batch.
    ///
    /// # Errors
    ///
    /// [`TrackerError::IdentifierExhausted`] (nothing is committed), or a
    /// store failure.
    pub async fn import(&self, batch: ParsedBatch) -> Result<ImportReport, TrackerError> {
        let request_id = Uuid::new_v4();
        match self
            .dispatch(request_id, RegistryAction::ImportBatch { request_id, batch })
            .await?
        {
            RegistryAction::BatchImported { report, .. } => Ok(report),
            other => Err(unexpected(&other)),
        }
    }

    /// Replace the registry with snapshot contents.
    ///
    /// Returns how many records were kept.
    ///
    /// # Errors
    ///
    /// Store failures only.
    pub async fn restore(&self, attendees: Vec<Attendee>) -> Result<usize, TrackerError> {
        let request_id = Uuid::new_v4();
        match self
            .dispatch(request_id, RegistryAction::Restore { request_id, attendees })
            .await?
        {
            RegistryAction::Restored { restored, .. } => Ok(restored),
            other => Err(unexpected(&other)),
        }
    }

    /// Fetch one attendee.
    ///
    /// # Errors
    ///
    /// [`TrackerError::NotFound`] when no attendee has this identifier.
    pub async fn get(&self, identifier: &str) -> Result<Attendee, TrackerError> {
        self.store
            .state(|state| state.get(identifier).cloned())
            .await
            .ok_or_else(|| TrackerError::NotFound {
                identifier: identifier.to_string(),
            })
    }

    /// Filtered, paged listing in registration order.
    pub async fn search(&self, query: &str, page: Page) -> Vec<Attendee> {
        self.store.state(|state| state.search(query, page)).await
    }

    /// Flag counts over one consistent version.
    pub async fn count_by_flags(&self) -> Stats {
        self.store.state(RegistryState::count_by_flags).await
    }

    /// Counts, percentages and role breakdown.
    pub async fn report(&self) -> StatsReport {
        self.store.state(RegistryState::report).await
    }

    /// Every attendee in registration order, with the revision they belong to.
    pub async fn snapshot(&self) -> (u64, Vec<Attendee>) {
        self.store
            .state(|state| (state.revision(), state.iter().cloned().collect()))
            .await
    }

    /// Current revision.
    pub async fn revision(&self) -> u64 {
        self.store.state(RegistryState::revision).await
    }

    async fn dispatch(
        &self,
        request_id: Uuid,
        command: RegistryAction,
    ) -> Result<RegistryAction, TrackerError> {
        let outcome = self
            .store
            .send_and_wait_for(
                command,
                |action| action.is_outcome_for(&request_id),
                self.timeout,
            )
            .await?;

        match outcome {
            RegistryAction::CommandRejected { error, .. } => Err(error),
            accepted => Ok(accepted),
        }
    }
}

fn unexpected(action: &RegistryAction) -> TrackerError {
    tracing::error!(event_type = action.event_type(), "Unexpected outcome for command");
    TrackerError::Unavailable
}

impl std::fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryHandle")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
