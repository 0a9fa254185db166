//! HTTP handlers.
//!
//! Handlers decode input, call the registry or verification service, and
//! encode the result. Business rules live in the registry reducer.

pub mod attendees;
pub mod backups;
pub mod imports;
pub mod stats;
pub mod verification;

use crate::error::TrackerError;
use axum::Json;
use event_tracker_web::AppError;
use serde::Serialize;

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    /// Greeting
    pub message: &'static str,
}

/// Welcome message.
#[allow(clippy::unused_async)]
pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to Event Tracker API",
    })
}

/// Map an extractor rejection (bad JSON, bad query string) to `INVALID_ARGUMENT`.
pub(crate) fn invalid_input(rejection: impl std::fmt::Display) -> AppError {
    TrackerError::InvalidArgument(rejection.to_string()).into()
}

/// Surface a failed blocking task as a 500.
pub(crate) fn task_failed(err: tokio::task::JoinError) -> AppError {
    AppError::internal("Background task failed").with_source(err.into())
}
