//! Registry state owned by the store.

use crate::stats::{Stats, StatsReport};
use crate::types::{Attendee, Identifier, Page};
use std::collections::HashMap;

/// All attendee records plus the indexes the registry needs.
///
/// Mutated only by [`RegistryReducer`](super::RegistryReducer) under the
/// store's write lock. Readers get `&RegistryState` under the read lock, so
/// every query sees one consistent version.
#[derive(Clone, Debug, Default)]
pub struct RegistryState {
    records: HashMap<Identifier, Attendee>,
    /// Identifiers by ascending `registration_time`, ties in insertion order
    order: Vec<Identifier>,
    /// Normalized email to owning identifier
    emails: HashMap<String, Identifier>,
    revision: u64,
}

impl RegistryState {
    /// Number of attendees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the registry holds no attendees.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Bumped on every accepted mutation.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Look up one attendee.
    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<&Attendee> {
        self.records.get(identifier)
    }

    /// Whether an identifier is already taken.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.records.contains_key(identifier)
    }

    /// Identifier owning a normalized email.
    #[must_use]
    pub fn email_owner(&self, email_key: &str) -> Option<&Identifier> {
        self.emails.get(email_key)
    }

    /// Attendees in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Attendee> + Clone {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Filter and page attendees in registration order.
    ///
    /// A blank query matches everyone. Otherwise a record matches when the
    /// trimmed query equals its identifier (ignoring ASCII case) or is a
    /// case-insensitive substring of its name or email.
    #[must_use]
    pub fn search(&self, query: &str, page: Page) -> Vec<Attendee> {
        let query = query.trim();
        let needle = query.to_lowercase();

        self.iter()
            .filter(|attendee| {
                query.is_empty()
                    || attendee.identifier.as_str().eq_ignore_ascii_case(query)
                    || attendee.name.to_lowercase().contains(&needle)
                    || attendee.email.to_lowercase().contains(&needle)
            })
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect()
    }

    /// Flag counts over the current version.
    #[must_use]
    pub fn count_by_flags(&self) -> Stats {
        Stats::from_attendees(self.iter())
    }

    /// Counts, percentages and role breakdown over the current version.
    #[must_use]
    pub fn report(&self) -> StatsReport {
        StatsReport::from_attendees(self.iter())
    }

    /// Insert a new attendee. Callers have checked identifier and email.
    pub(crate) fn insert(&mut self, attendee: Attendee) {
        let at = attendee.registration_time;
        let position = self.order.partition_point(|id| {
            self.records
                .get(id)
                .is_some_and(|existing| existing.registration_time <= at)
        });

        self.order.insert(position, attendee.identifier.clone());
        self.emails
            .insert(attendee.email_key(), attendee.identifier.clone());
        self.records.insert(attendee.identifier.clone(), attendee);
        self.revision += 1;
    }

    /// Replace an existing attendee, keeping its position.
    pub(crate) fn replace(&mut self, attendee: Attendee) {
        if let Some(previous) = self.records.get(attendee.identifier.as_str()) {
            let previous_key = previous.email_key();
            let next_key = attendee.email_key();
            if previous_key != next_key {
                self.emails.remove(&previous_key);
                self.emails.insert(next_key, attendee.identifier.clone());
            }
        }
        self.records.insert(attendee.identifier.clone(), attendee);
        self.revision += 1;
    }

    /// Rebuild from a snapshot. Records repeating an identifier or a
    /// normalized email are dropped; the first one wins.
    ///
    /// Returns how many records were dropped.
    pub(crate) fn restore(&mut self, mut attendees: Vec<Attendee>) -> usize {
        // Stable, so equal timestamps keep snapshot order
        attendees.sort_by_key(|attendee| attendee.registration_time);

        let mut restored = Self {
            revision: self.revision + 1,
            ..Self::default()
        };
        let mut dropped = 0;

        for attendee in attendees {
            if restored.contains(attendee.identifier.as_str())
                || restored.email_owner(&attendee.email_key()).is_some()
            {
                dropped += 1;
                continue;
            }
            restored.order.push(attendee.identifier.clone());
            restored
                .emails
                .insert(attendee.email_key(), attendee.identifier.clone());
            restored.records.insert(attendee.identifier.clone(), attendee);
        }

        *self = restored;
        dropped
    }
}
