//! Domain error taxonomy and its HTTP mapping.

use axum::http::StatusCode;
use event_tracker_runtime::StoreError;
use event_tracker_web::AppError;
use thiserror::Error;

/// Errors surfaced by registry, import and verification operations.
///
/// Variants are `Clone` because they travel inside `CommandRejected`
/// actions from the reducer back to the waiting caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// No attendee carries this identifier
    #[error("Attendee {identifier} not found")]
    NotFound {
        /// Identifier that was looked up
        identifier: String,
    },

    /// Another attendee already owns this (normalized) email
    #[error("An attendee with email {email} already exists")]
    EmailConflict {
        /// Email as submitted
        email: String,
    },

    /// Malformed update, draft or pagination parameters
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Upload could not be read as CSV at all
    #[error("Malformed CSV: {0}")]
    MalformedCsv(String),

    /// The registry did not answer within the request timeout
    #[error("Timed out waiting for the registry")]
    Timeout,

    /// Verification token is malformed, forged, expired or names no live attendee
    #[error("Invalid verification token: {reason}")]
    Invalid {
        /// Why the token was refused (logged, echoed to the client)
        reason: String,
    },

    /// Every identifier candidate collided
    #[error("No free identifier after {attempts} attempts")]
    IdentifierExhausted {
        /// Candidates tried before giving up
        attempts: u32,
    },

    /// The registry store is shutting down
    #[error("Registry is unavailable")]
    Unavailable,
}

impl TrackerError {
    /// Build an [`TrackerError::Invalid`] with a reason.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }

    /// Machine-readable error kind carried in response bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::EmailConflict { .. } => "EMAIL_CONFLICT",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::MalformedCsv(_) => "MALFORMED_CSV",
            Self::Timeout => "TIMEOUT",
            Self::Invalid { .. } => "INVALID_TOKEN",
            Self::IdentifierExhausted { .. } => "IDENTIFIER_EXHAUSTED",
            Self::Unavailable => "UNAVAILABLE",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } | Self::Invalid { .. } => StatusCode::NOT_FOUND,
            Self::EmailConflict { .. } => StatusCode::CONFLICT,
            Self::InvalidArgument(_) | Self::MalformedCsv(_) => StatusCode::BAD_REQUEST,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::IdentifierExhausted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<StoreError> for TrackerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Timeout => Self::Timeout,
            StoreError::ShutdownInProgress
            | StoreError::ShutdownTimeout(_)
            | StoreError::ChannelClosed => Self::Unavailable,
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        Self::new(err.status(), err.to_string(), err.kind().to_string())
    }
}
