//! Router configuration for the tracker.
//!
//! Builds the complete Axum router with all endpoints.

use super::state::AppState;
use crate::api::{self, attendees, backups, imports, stats, verification};
use crate::config::ServerConfig;
use crate::registry::{RegistryAction, RegistryEnvironment, RegistryReducer, RegistryState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use event_tracker_web::{
    correlation_id_layer,
    handlers::{health_check, health_check_with_store},
    request_timeout_layer,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// Layers run outermost first: correlation id, CORS, tracing, the request
/// timeout, then the upload size limit.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(api::welcome))
        // Health checks
        .route("/health", get(health_check))
        .route(
            "/health/ready",
            get(health_check_with_store::<
                RegistryState,
                RegistryAction,
                RegistryEnvironment,
                RegistryReducer,
            >),
        )
        // Attendees
        .route(
            "/attendees",
            get(attendees::list_attendees).post(attendees::create_attendee),
        )
        .route(
            "/attendee/:id",
            get(attendees::get_attendee).put(attendees::update_attendee),
        )
        .route("/upload-csv", post(imports::upload_csv))
        // Verification
        .route("/qrcode/:id", get(verification::qr_code))
        .route("/verify", post(verification::verify))
        // Aggregates
        .route("/stats", get(stats::stats))
        .route("/stats/report", get(stats::stats_report))
        .route("/export.csv", get(stats::export_csv))
        // Persistence
        .route("/backup", post(backups::create_backup))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(request_timeout_layer(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(correlation_id_layer())
        .with_state(state)
}
