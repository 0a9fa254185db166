//! HTTP handlers shared by every service built on the store.

pub mod health;

pub use health::{health_check, health_check_with_store};
