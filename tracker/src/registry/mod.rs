//! The attendee registry: state, commands, reducer and the handle used to
//! reach it.
//!
//! All mutations are commands sent through a [`Store`](event_tracker_runtime::Store),
//! which serializes them under one write lock. That serialization is what
//! makes email uniqueness, identifier allocation and server-side toggles
//! safe under concurrent requests.

mod actions;
mod environment;
mod handle;
mod reducer;
mod state;

pub use actions::RegistryAction;
pub use environment::{RegistryEnvironment, DEFAULT_IDENTIFIER_RETRIES};
pub use handle::{RegistryHandle, RegistryStore};
pub use reducer::RegistryReducer;
pub use state::RegistryState;
