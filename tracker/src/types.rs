//! Domain types for the attendee registry.
//!
//! Attendees, the drafts they are created from, partial updates, and
//! pagination. Validation that only needs the value itself lives here;
//! checks against other records (email uniqueness) live in the reducer.

use crate::error::TrackerError;
use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque attendee identifier, assigned once at creation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Wrap an identifier string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Attendee
// ============================================================================

/// A person tracked at the event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    /// Unique, immutable identifier
    pub identifier: Identifier,
    /// Display name (non-blank)
    pub name: String,
    /// Contact email, trimmed; uniqueness is case-insensitive
    pub email: String,
    /// Free-form role such as `speaker` or `organiser`
    pub role: Option<String>,
    /// Contact phone number
    pub phone_number: Option<String>,
    /// Checked in at the desk
    pub registered: bool,
    /// Lunch handed out
    pub lunch_collected: bool,
    /// Welcome kit handed out
    pub kit_collected: bool,
    /// When the record was created; never changes
    pub registration_time: DateTime<Utc>,
    /// When `registered` last went from false to true
    #[serde(default)]
    pub checked_in_at: Option<DateTime<Utc>>,
}

impl Attendee {
    /// Build a fresh attendee from an already validated draft.
    ///
    /// All status flags start false.
    #[must_use]
    pub fn from_draft(identifier: Identifier, draft: AttendeeDraft, now: DateTime<Utc>) -> Self {
        Self {
            identifier,
            name: draft.name,
            email: draft.email,
            role: draft.role,
            phone_number: draft.phone_number,
            registered: false,
            lunch_collected: false,
            kit_collected: false,
            registration_time: now,
            checked_in_at: None,
        }
    }

    /// Current value of a status flag.
    #[must_use]
    pub const fn flag(&self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::Registered => self.registered,
            StatusFlag::LunchCollected => self.lunch_collected,
            StatusFlag::KitCollected => self.kit_collected,
        }
    }

    /// Set a status flag, maintaining `checked_in_at` for `registered`.
    pub fn set_flag(&mut self, flag: StatusFlag, value: bool, now: DateTime<Utc>) {
        match flag {
            StatusFlag::Registered => {
                if value && !self.registered {
                    self.checked_in_at = Some(now);
                } else if !value {
                    self.checked_in_at = None;
                }
                self.registered = value;
            },
            StatusFlag::LunchCollected => self.lunch_collected = value,
            StatusFlag::KitCollected => self.kit_collected = value,
        }
    }

    /// Email key used for uniqueness checks.
    #[must_use]
    pub fn email_key(&self) -> String {
        normalize_email(&self.email)
    }
}

/// Independent boolean status flags on an attendee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFlag {
    /// `registered`
    Registered,
    /// `lunch_collected`
    LunchCollected,
    /// `kit_collected`
    KitCollected,
}

impl StatusFlag {
    /// All flags, in display order.
    pub const ALL: [Self; 3] = [Self::Registered, Self::LunchCollected, Self::KitCollected];

    /// JSON field name of the flag.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::LunchCollected => "lunch_collected",
            Self::KitCollected => "kit_collected",
        }
    }
}

// ============================================================================
// Drafts
// ============================================================================

/// Input for creating one attendee (JSON body or one CSV row).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttendeeDraft {
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Optional role
    #[serde(default)]
    pub role: Option<String>,
    /// Optional phone number
    #[serde(default)]
    pub phone_number: Option<String>,
}

/// Why a draft cannot become an attendee.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftError {
    /// Name is empty after trimming
    #[error("name must not be empty")]
    MissingName,
    /// Email is empty or not `local@domain`
    #[error("email must look like local@domain")]
    InvalidEmail,
}

impl From<DraftError> for TrackerError {
    fn from(err: DraftError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl AttendeeDraft {
    /// Trim every field, drop blank optionals, and check name and email.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError`] when the name is blank or the email is malformed.
    pub fn validated(self) -> Result<Self, DraftError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DraftError::MissingName);
        }

        let email = self.email.trim().to_string();
        if !is_valid_email(&email) {
            return Err(DraftError::InvalidEmail);
        }

        Ok(Self {
            name,
            email,
            role: non_blank(self.role),
            phone_number: non_blank(self.phone_number),
        })
    }
}

/// Lowercased, trimmed email used as the uniqueness key.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Exactly one `@` with non-empty local and domain parts.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Partial updates
// ============================================================================

/// Partial update for `PUT /attendee/{id}`.
///
/// Only present fields are applied. `toggle` flips the named flags against
/// the stored value at the moment the update is applied. An empty string
/// for `role` or `phone_number` clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttendeePatch {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New email
    #[serde(default)]
    pub email: Option<String>,
    /// New role (empty clears)
    #[serde(default)]
    pub role: Option<String>,
    /// New phone number (empty clears)
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Explicit `registered` value
    #[serde(default)]
    pub registered: Option<bool>,
    /// Explicit `lunch_collected` value
    #[serde(default)]
    pub lunch_collected: Option<bool>,
    /// Explicit `kit_collected` value
    #[serde(default)]
    pub kit_collected: Option<bool>,
    /// Flags to flip server-side
    #[serde(default)]
    pub toggle: Vec<StatusFlag>,
    /// Set when the body mentions `identifier` at all
    #[serde(default, rename = "identifier", deserialize_with = "field_present")]
    pub touches_identifier: bool,
    /// Set when the body mentions `registration_time` at all
    #[serde(default, rename = "registration_time", deserialize_with = "field_present")]
    pub touches_registration_time: bool,
}

fn field_present<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    IgnoredAny::deserialize(deserializer).map(|_| true)
}

impl AttendeePatch {
    /// Explicit value for a flag, if the patch sets one.
    #[must_use]
    pub const fn explicit(&self, flag: StatusFlag) -> Option<bool> {
        match flag {
            StatusFlag::Registered => self.registered,
            StatusFlag::LunchCollected => self.lunch_collected,
            StatusFlag::KitCollected => self.kit_collected,
        }
    }

    /// Reject patches that touch immutable fields or contradict themselves.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidArgument`] describing the first problem.
    pub fn check(&self) -> Result<(), TrackerError> {
        if self.touches_identifier {
            return Err(TrackerError::InvalidArgument(
                "identifier cannot be changed".to_string(),
            ));
        }
        if self.touches_registration_time {
            return Err(TrackerError::InvalidArgument(
                "registration_time cannot be changed".to_string(),
            ));
        }

        for (index, flag) in self.toggle.iter().enumerate() {
            if self.toggle[..index].contains(flag) {
                return Err(TrackerError::InvalidArgument(format!(
                    "{} is toggled more than once",
                    flag.field_name()
                )));
            }
            if self.explicit(*flag).is_some() {
                return Err(TrackerError::InvalidArgument(format!(
                    "{} is both set and toggled",
                    flag.field_name()
                )));
            }
        }

        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(DraftError::MissingName.into());
        }
        if self
            .email
            .as_deref()
            .is_some_and(|email| !is_valid_email(email.trim()))
        {
            return Err(DraftError::InvalidEmail.into());
        }

        Ok(())
    }

    /// Apply the patch to a copy of `current`.
    ///
    /// Callers run [`AttendeePatch::check`] first.
    #[must_use]
    pub fn apply(&self, current: &Attendee, now: DateTime<Utc>) -> Attendee {
        let mut next = current.clone();

        if let Some(name) = &self.name {
            next.name = name.trim().to_string();
        }
        if let Some(email) = &self.email {
            next.email = email.trim().to_string();
        }
        if let Some(role) = &self.role {
            next.role = non_blank(Some(role.clone()));
        }
        if let Some(phone) = &self.phone_number {
            next.phone_number = non_blank(Some(phone.clone()));
        }

        for flag in StatusFlag::ALL {
            if let Some(value) = self.explicit(flag) {
                next.set_flag(flag, value, now);
            }
        }
        for flag in &self.toggle {
            let flipped = !next.flag(*flag);
            next.set_flag(*flag, flipped, now);
        }

        next
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Validated `offset`/`limit` pair for search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    /// Records to skip (≥ 0)
    pub offset: usize,
    /// Maximum records to return (≥ 1)
    pub limit: usize,
}

impl Page {
    /// Validate raw pagination parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidArgument`] for a negative offset or a
    /// limit below 1.
    pub fn new(
        offset: Option<i64>,
        limit: Option<i64>,
        default_limit: usize,
    ) -> Result<Self, TrackerError> {
        let offset = match offset {
            None => 0,
            Some(value) => usize::try_from(value).map_err(|_| {
                TrackerError::InvalidArgument(format!("skip must be >= 0, got {value}"))
            })?,
        };

        let limit = match limit {
            None => default_limit,
            Some(value) => usize::try_from(value)
                .ok()
                .filter(|limit| *limit >= 1)
                .ok_or_else(|| {
                    TrackerError::InvalidArgument(format!("limit must be >= 1, got {value}"))
                })?,
        };

        Ok(Self { offset, limit })
    }

    /// Everything from the start, up to `limit` records.
    #[must_use]
    pub const fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }
}
