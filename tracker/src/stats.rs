//! Registry-wide counts and the percentages derived from them.

use crate::types::Attendee;
use serde::Serialize;
use std::collections::BTreeMap;

/// Role label for attendees without a role.
pub const UNASSIGNED_ROLE: &str = "Unassigned";

/// Flag counts over the whole registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Number of attendees
    pub total: usize,
    /// Attendees checked in
    pub registered: usize,
    /// Attendees who collected lunch
    pub lunch_collected: usize,
    /// Attendees who collected their kit
    pub kit_collected: usize,
}

impl Stats {
    /// Count flags over a consistent view of the registry.
    pub fn from_attendees<'a>(attendees: impl IntoIterator<Item = &'a Attendee>) -> Self {
        attendees.into_iter().fold(Self::default(), |mut stats, attendee| {
            stats.total += 1;
            stats.registered += usize::from(attendee.registered);
            stats.lunch_collected += usize::from(attendee.lunch_collected);
            stats.kit_collected += usize::from(attendee.kit_collected);
            stats
        })
    }
}

/// `count / total × 100` rounded half away from zero, 0 when `total` is 0.
///
/// Integer-only: `(200·count + total) / (2·total)`.
#[must_use]
pub fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let count = count as u128;
    let total = total as u128;
    u32::try_from((200 * count + total) / (2 * total)).unwrap_or(u32::MAX)
}

/// Per-role slice of the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoleBreakdown {
    /// Role as stored, or [`UNASSIGNED_ROLE`]
    pub role: String,
    /// Attendees with this role
    pub total: usize,
    /// Of those, how many are checked in
    pub registered: usize,
}

/// Counts plus derived percentages and a per-role breakdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    /// Raw counts
    #[serde(flatten)]
    pub counts: Stats,
    /// `registered` as a percentage of `total`
    pub registered_percentage: u32,
    /// `lunch_collected` as a percentage of `total`
    pub lunch_percentage: u32,
    /// `kit_collected` as a percentage of `total`
    pub kit_percentage: u32,
    /// Breakdown sorted by role name
    pub by_role: Vec<RoleBreakdown>,
}

impl StatsReport {
    /// Build the report over a consistent view of the registry.
    pub fn from_attendees<'a>(attendees: impl IntoIterator<Item = &'a Attendee> + Clone) -> Self {
        let counts = Stats::from_attendees(attendees.clone());

        let mut roles: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for attendee in attendees {
            let role = attendee.role.as_deref().unwrap_or(UNASSIGNED_ROLE);
            let entry = roles.entry(role).or_default();
            entry.0 += 1;
            entry.1 += usize::from(attendee.registered);
        }

        Self {
            registered_percentage: percentage(counts.registered, counts.total),
            lunch_percentage: percentage(counts.lunch_collected, counts.total),
            kit_percentage: percentage(counts.kit_collected, counts.total),
            by_role: roles
                .into_iter()
                .map(|(role, (total, registered))| RoleBreakdown {
                    role: role.to_string(),
                    total,
                    registered,
                })
                .collect(),
            counts,
        }
    }
}
