//! # Event Tracker Testing
//!
//! Testing utilities for reducers and stores.
//!
//! This crate provides:
//! - Deterministic implementations of Environment traits
//! - A Given-When-Then harness for reducers
//! - Property-based testing strategies
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use event_tracker_testing::{test_clock, SequentialIdGenerator};
//! use event_tracker_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_registration_flow() {
//!     let env = RegistryEnvironment::new(
//!         Arc::new(test_clock()),
//!         Arc::new(SequentialIdGenerator::new()),
//!     );
//!     let store = Store::new(RegistryState::default(), RegistryReducer::new(), env);
//!     let registry = RegistryHandle::new(store, Duration::from_secs(1));
//!
//!     let created = registry.create(draft).await?;
//!     assert_eq!(created.identifier.as_str(), "TEST000000000001");
//! }
//! ```

use chrono::{DateTime, Utc};
use event_tracker_core::environment::{Clock, IdentifierGenerator};

mod reducer_test;

pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, IdentifierGenerator, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use event_tracker_testing::mocks::FixedClock;
    /// use event_tracker_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Predictable identifiers: `TEST000000000001`, `TEST000000000002`, ...
    ///
    /// Each candidate is 16 characters from the identifier alphabet.
    #[derive(Debug, Default)]
    pub struct SequentialIdGenerator {
        next: AtomicU64,
    }

    impl SequentialIdGenerator {
        /// Start the sequence at 1
        #[must_use]
        pub const fn new() -> Self {
            Self {
                next: AtomicU64::new(0),
            }
        }
    }

    impl IdentifierGenerator for SequentialIdGenerator {
        fn next_identifier(&self) -> String {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            format!("TEST{n:012}")
        }
    }

    /// Replays a scripted list of candidates, then falls back to a sequence
    ///
    /// Used to force identifier collisions.
    #[derive(Debug, Default)]
    pub struct ScriptedIdGenerator {
        script: Mutex<Vec<String>>,
        fallback: SequentialIdGenerator,
    }

    impl ScriptedIdGenerator {
        /// Candidates are handed out in the given order
        #[must_use]
        pub fn new<I, T>(candidates: I) -> Self
        where
            I: IntoIterator<Item = T>,
            T: Into<String>,
        {
            let mut script: Vec<String> = candidates.into_iter().map(Into::into).collect();
            script.reverse();
            Self {
                script: Mutex::new(script),
                fallback: SequentialIdGenerator::new(),
            }
        }
    }

    impl IdentifierGenerator for ScriptedIdGenerator {
        fn next_identifier(&self) -> String {
            let scripted = self.script.lock().ok().and_then(|mut script| script.pop());
            scripted.unwrap_or_else(|| self.fallback.next_identifier())
        }
    }
}

/// Property-based testing strategies using proptest
pub mod properties {
    use proptest::prelude::*;

    /// Well-formed email addresses (`local@domain.tld`)
    pub fn email() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9._]{0,11}", "[a-z]{2,10}", "(com|org|net|io)")
            .prop_map(|(local, domain, tld)| format!("{local}@{domain}.{tld}"))
    }

    /// Non-blank display names
    pub fn name() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{1,9}( [A-Z][a-z]{1,9})?"
    }

    /// Optional role, drawn mostly from the roles the badge palette knows
    pub fn role() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("attendee".to_string())),
            Just(Some("speaker".to_string())),
            Just(Some("organiser".to_string())),
            "[a-z]{3,8}".prop_map(Some),
        ]
    }

    /// Email with random surrounding whitespace and letter case
    pub fn email_variant(email: String) -> impl Strategy<Value = String> {
        (any::<bool>(), " {0,2}", " {0,2}").prop_map(move |(upper, lead, trail)| {
            let body = if upper {
                email.to_uppercase()
            } else {
                email.clone()
            };
            format!("{lead}{body}{trail}")
        })
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock, ScriptedIdGenerator, SequentialIdGenerator};
