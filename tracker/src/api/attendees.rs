//! Attendee endpoints.
//!
//! - `GET /attendees` - search and page
//! - `POST /attendees` - register one attendee
//! - `GET /attendee/:id` - fetch one
//! - `PUT /attendee/:id` - partial update or server-side toggle

use super::invalid_input;
use crate::server::AppState;
use crate::types::{Attendee, AttendeeDraft, AttendeePatch, Identifier, Page};
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use event_tracker_web::{AppError, CorrelationId};
use serde::Deserialize;

/// Query parameters for `GET /attendees`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Name/email substring or exact identifier
    #[serde(default)]
    pub search: Option<String>,
    /// Records to skip
    #[serde(default)]
    pub skip: Option<i64>,
    /// Page size
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Search attendees in registration order.
///
/// # Example
///
/// ```bash
/// curl 'http://localhost:8000/attendees?search=smith&skip=0&limit=20'
/// ```
pub async fn list_attendees(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<Attendee>>, AppError> {
    let Query(query) = query.map_err(invalid_input)?;
    let page = Page::new(query.skip, query.limit, state.default_page_limit)?;

    let attendees = state
        .registry
        .search(query.search.as_deref().unwrap_or_default(), page)
        .await;
    Ok(Json(attendees))
}

/// Register one attendee.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8000/attendees \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Ada Lovelace", "email": "ada@example.com", "role": "speaker"}'
/// ```
pub async fn create_attendee(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    draft: Result<Json<AttendeeDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Attendee>), AppError> {
    let Json(draft) = draft.map_err(invalid_input)?;
    let attendee = state.registry.create(draft).await?;

    tracing::info!(
        correlation_id = %correlation_id.0,
        identifier = %attendee.identifier,
        "Attendee registered"
    );
    Ok((StatusCode::CREATED, Json(attendee)))
}

/// Fetch one attendee.
pub async fn get_attendee(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<Attendee>, AppError> {
    Ok(Json(state.registry.get(&identifier).await?))
}

/// Apply a partial update.
///
/// Only fields present in the body change. `toggle` flips flags against
/// their stored value, so two desks toggling at once never lose an update.
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:8000/attendee/ABCDEF0123456789 \
///   -H "Content-Type: application/json" \
///   -d '{"toggle": ["lunch_collected"]}'
/// ```
pub async fn update_attendee(
    State(state): State<AppState>,
    correlation_id: CorrelationId,
    Path(identifier): Path<String>,
    patch: Result<Json<AttendeePatch>, JsonRejection>,
) -> Result<Json<Attendee>, AppError> {
    let Json(patch) = patch.map_err(invalid_input)?;
    let attendee = state
        .registry
        .update(Identifier::new(identifier), patch)
        .await?;

    tracing::debug!(
        correlation_id = %correlation_id.0,
        identifier = %attendee.identifier,
        "Attendee updated"
    );
    Ok(Json(attendee))
}
