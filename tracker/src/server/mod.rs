//! HTTP server module for the tracker.
//!
//! This module provides the Axum-based HTTP server with:
//! - Application state management
//! - Router configuration
//! - Tracking of work started after a response

pub mod routes;
pub mod state;
pub mod tasks;

pub use routes::build_router;
pub use state::AppState;
pub use tasks::BackgroundTasks;
