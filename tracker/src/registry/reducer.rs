//! Registry business logic.
//!
//! Each command is validated against the current state and either applied
//! in full or rejected with no change. The reducer runs under the store's
//! write lock, so check-then-insert sequences (email uniqueness, identifier
//! allocation) cannot interleave with other mutations.

use super::actions::RegistryAction;
use super::environment::RegistryEnvironment;
use super::state::RegistryState;
use crate::csv_import::{ImportReport, ParsedBatch, RejectReason, RejectedRow};
use crate::error::TrackerError;
use crate::types::{Attendee, AttendeeDraft, AttendeePatch, Identifier};
use event_tracker_core::effect::Effect;
use event_tracker_core::reducer::Reducer;
use event_tracker_core::{smallvec, SmallVec};
use std::collections::HashSet;
use uuid::Uuid;

/// Reducer for [`RegistryAction`].
#[derive(Clone, Debug, Default)]
pub struct RegistryReducer;

impl RegistryReducer {
    /// Create the reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn create(
        state: &mut RegistryState,
        draft: AttendeeDraft,
        env: &RegistryEnvironment,
    ) -> Result<Attendee, TrackerError> {
        let draft = draft.validated()?;

        let email_key = crate::types::normalize_email(&draft.email);
        if state.email_owner(&email_key).is_some() {
            return Err(TrackerError::EmailConflict { email: draft.email });
        }

        let identifier = Self::allocate_identifier(state, &HashSet::new(), env)?;
        let attendee = Attendee::from_draft(identifier, draft, env.clock.now());
        state.insert(attendee.clone());
        Ok(attendee)
    }

    fn update(
        state: &mut RegistryState,
        identifier: &Identifier,
        patch: &AttendeePatch,
        env: &RegistryEnvironment,
    ) -> Result<Attendee, TrackerError> {
        let current = state
            .get(identifier.as_str())
            .ok_or_else(|| TrackerError::NotFound {
                identifier: identifier.to_string(),
            })?;

        patch.check()?;

        let next = patch.apply(current, env.clock.now());

        if let Some(owner) = state.email_owner(&next.email_key()) {
            if owner != identifier {
                return Err(TrackerError::EmailConflict { email: next.email });
            }
        }

        state.replace(next.clone());
        Ok(next)
    }

    fn import(
        state: &mut RegistryState,
        batch: ParsedBatch,
        env: &RegistryEnvironment,
    ) -> Result<ImportReport, TrackerError> {
        let mut rejected = batch.rejected;
        let mut accepted = Vec::with_capacity(batch.rows.len());

        for row in batch.rows {
            let email_key = crate::types::normalize_email(&row.draft.email);
            if state.email_owner(&email_key).is_some() {
                rejected.push(RejectedRow {
                    row: row.row,
                    reason: RejectReason::EmailConflict,
                });
            } else {
                accepted.push(row.draft);
            }
        }

        // Allocate every identifier before inserting anything, so exhaustion
        // leaves the registry untouched
        let mut reserved = HashSet::with_capacity(accepted.len());
        let mut identifiers = Vec::with_capacity(accepted.len());
        for _ in &accepted {
            let identifier = Self::allocate_identifier(state, &reserved, env)?;
            reserved.insert(identifier.clone());
            identifiers.push(identifier);
        }

        let now = env.clock.now();
        let attendees: Vec<Attendee> = accepted
            .into_iter()
            .zip(identifiers)
            .map(|(draft, identifier)| Attendee::from_draft(identifier, draft, now))
            .collect();

        for attendee in &attendees {
            state.insert(attendee.clone());
        }

        rejected.sort_by_key(|rejection| rejection.row);

        Ok(ImportReport {
            total_processed: batch.total_processed,
            added: attendees.len(),
            skipped: rejected.len(),
            attendees,
            rejected,
        })
    }

    /// Draw candidates until one is free in both `state` and `reserved`.
    fn allocate_identifier(
        state: &RegistryState,
        reserved: &HashSet<Identifier>,
        env: &RegistryEnvironment,
    ) -> Result<Identifier, TrackerError> {
        let attempts = env.max_identifier_retries.saturating_add(1);
        for attempt in 1..=attempts {
            let candidate = Identifier::new(env.identifiers.next_identifier());
            if !state.contains(candidate.as_str()) && !reserved.contains(&candidate) {
                return Ok(candidate);
            }
            tracing::warn!(attempt, "Identifier collision, drawing again");
            metrics::counter!("registry.identifier.collisions").increment(1);
        }
        Err(TrackerError::IdentifierExhausted { attempts })
    }

    fn outcome(
        request_id: Uuid,
        result: Result<RegistryAction, TrackerError>,
    ) -> SmallVec<[Effect<RegistryAction>; 4]> {
        let action = result.unwrap_or_else(|error| {
            tracing::debug!(%request_id, kind = error.kind(), %error, "Command rejected");
            metrics::counter!("registry.commands.rejected", "kind" => error.kind()).increment(1);
            RegistryAction::CommandRejected { request_id, error }
        });
        smallvec![Effect::emit(action)]
    }
}

impl Reducer for RegistryReducer {
    type State = RegistryState;
    type Action = RegistryAction;
    type Environment = RegistryEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            RegistryAction::CreateAttendee { request_id, draft } => Self::outcome(
                request_id,
                Self::create(state, draft, env)
                    .map(|attendee| RegistryAction::AttendeeCreated { request_id, attendee }),
            ),

            RegistryAction::UpdateAttendee {
                request_id,
                identifier,
                patch,
            } => Self::outcome(
                request_id,
                Self::update(state, &identifier, &patch, env)
                    .map(|attendee| RegistryAction::AttendeeUpdated { request_id, attendee }),
            ),

            RegistryAction::ImportBatch { request_id, batch } => Self::outcome(
                request_id,
                Self::import(state, batch, env)
                    .map(|report| RegistryAction::BatchImported { request_id, report }),
            ),

            RegistryAction::Restore {
                request_id,
                attendees,
            } => {
                let dropped = state.restore(attendees);
                if dropped > 0 {
                    tracing::warn!(dropped, "Dropped duplicate records from snapshot");
                }
                Self::outcome(
                    request_id,
                    Ok(RegistryAction::Restored {
                        request_id,
                        restored: state.len(),
                        dropped,
                    }),
                )
            },

            // Outcomes fed back by the runtime carry no further work
            RegistryAction::AttendeeCreated { .. }
            | RegistryAction::AttendeeUpdated { .. }
            | RegistryAction::BatchImported { .. }
            | RegistryAction::Restored { .. }
            | RegistryAction::CommandRejected { .. } => smallvec![Effect::None],
        }
    }
}
