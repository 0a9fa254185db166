//! Axum integration for the event tracker.
//!
//! This crate is the imperative shell around the registry reducer. Handlers
//! decode HTTP input into actions, dispatch them through a `Store`, and map
//! outcomes back to responses.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Imperative Shell (Axum)         │  ← HTTP, JSON, multipart
//! │  - Request parsing                      │  ← Timeouts, CORS
//! │  - Response serialization               │  ← Correlation ids, tracing
//! ├─────────────────────────────────────────┤
//! │         Functional Core                 │
//! │  - Registry reducer                     │  ← Serialized by the Store
//! │  - Effect descriptions (values)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract data** from the request (JSON, query, multipart)
//! 3. **Build Action** carrying a fresh request id
//! 4. **Dispatch** through `Store::send_and_wait_for`
//! 5. **Map outcome** to a response or an [`AppError`]
//!
//! # Example
//!
//! ```ignore
//! use event_tracker_web::{AppError, request_timeout_layer, correlation_id_layer};
//! use axum::{Router, routing::get};
//!
//! let app = Router::new()
//!     .route("/attendee/:id", get(get_attendee))
//!     .layer(request_timeout_layer(Duration::from_secs(10)))
//!     .layer(correlation_id_layer())
//!     .with_state(app_state);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ClientIp, CorrelationId, UserAgent};
pub use middleware::{
    correlation_id_layer, request_timeout_layer, CORRELATION_ID_HEADER,
};
