//! Injected dependencies for the registry reducer.

use event_tracker_core::environment::{Clock, IdentifierGenerator, SystemClock};
use std::sync::Arc;

use crate::identifier::RandomIdentifierGenerator;

/// Default number of extra identifier draws after a collision.
pub const DEFAULT_IDENTIFIER_RETRIES: u32 = 8;

/// Time and identifier sources used by the reducer.
#[derive(Clone)]
pub struct RegistryEnvironment {
    /// Stamps `registration_time` and `checked_in_at`
    pub clock: Arc<dyn Clock>,
    /// Proposes identifier candidates
    pub identifiers: Arc<dyn IdentifierGenerator>,
    /// Extra draws allowed after the first candidate collides
    pub max_identifier_retries: u32,
}

impl RegistryEnvironment {
    /// Build an environment from explicit dependencies.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, identifiers: Arc<dyn IdentifierGenerator>) -> Self {
        Self {
            clock,
            identifiers,
            max_identifier_retries: DEFAULT_IDENTIFIER_RETRIES,
        }
    }

    /// Production environment: system clock and random identifiers.
    #[must_use]
    pub fn production() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(RandomIdentifierGenerator))
    }

    /// Override the collision retry bound.
    #[must_use]
    pub fn with_max_identifier_retries(mut self, retries: u32) -> Self {
        self.max_identifier_retries = retries;
        self
    }
}

impl std::fmt::Debug for RegistryEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEnvironment")
            .field("max_identifier_retries", &self.max_identifier_retries)
            .finish_non_exhaustive()
    }
}
