//! Event Tracker - attendee registry and verification service
//!
//! Tracks the people at an event: who registered, who has been checked in
//! at the desk, and who collected lunch or a welcome kit. Badges carry a
//! signed token in a QR code that the desk scans to pull up the attendee.
//!
//! # Architecture
//!
//! ```text
//!   HTTP (Axum)                       Background
//! ┌──────────────────────┐        ┌──────────────────────┐
//! │ /attendees /verify   │        │ Snapshot task        │
//! │ /upload-csv /stats   │        │ (attendees.json)     │
//! └──────────┬───────────┘        └──────────┬───────────┘
//!            │ RegistryHandle                │
//!            ▼                               ▼
//! ┌───────────────────────────────────────────────────────┐
//! │ Store<RegistryState, RegistryAction, ...>             │
//! │  RegistryReducer: one command at a time               │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Features
//!
//! ## Serialized mutations
//!
//! Every create, update and import runs inside the reducer while the store
//! holds its write lock, so email uniqueness and server-side flag toggles
//! are never raced.
//!
//! ## All-or-nothing identifier allocation
//!
//! Identifiers are random 16-character `A-Z0-9` strings. A batch import draws
//! every identifier before touching state; if the generator keeps
//! colliding, nothing is inserted.
//!
//! ## Stateless verification
//!
//! Tokens are `ETK1.<id>.<issued>.<tag>`, tagged with a server secret. Any
//! instance sharing the secret can verify a badge.
//!
//! # Usage
//!
//! See [`registry`] for the reducer and its tests, and [`app::TrackerApp`]
//! for how the pieces are wired.

#![forbid(unsafe_code)]

pub mod api;
pub mod app;
pub mod config;
pub mod csv_import;
pub mod error;
pub mod export;
pub mod identifier;
pub mod persistence;
pub mod registry;
pub mod server;
pub mod stats;
pub mod types;
pub mod verification;

pub use app::TrackerApp;
pub use config::Config;
pub use error::TrackerError;
pub use registry::{RegistryAction, RegistryHandle, RegistryReducer, RegistryState};
pub use types::{Attendee, AttendeeDraft, AttendeePatch, Identifier, Page, StatusFlag};
