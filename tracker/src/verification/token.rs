//! Signed, self-describing verification tokens.
//!
//! Format: `ETK1.<id>.<issued>.<tag>`, every segment base64url without
//! padding. `issued` is the big-endian unix-seconds issue time. `tag` is the
//! first 16 bytes of `SHA-256(secret "." id "." issued)` over the encoded
//! segments. Decoding needs only the secret; whether the attendee still
//! exists is checked against the registry at verification time.

use crate::error::TrackerError;
use crate::registry::RegistryHandle;
use crate::types::{Attendee, Identifier};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use event_tracker_core::environment::Clock;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Version prefix of the current token format.
pub const TOKEN_PREFIX: &str = "ETK1";

const TAG_LEN: usize = 16;

/// Issues and checks verification tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    max_age: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Create a service keyed by `secret`. Tokens never expire unless
    /// [`TokenService::with_max_age`] is set.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: secret.into(),
            max_age: None,
            clock,
        }
    }

    /// Reject tokens issued longer ago than `max_age`.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Issue a token for `identifier`, stamped with the current time.
    #[must_use]
    pub fn issue(&self, identifier: &Identifier) -> String {
        let id_segment = URL_SAFE_NO_PAD.encode(identifier.as_str());
        let issued_segment = URL_SAFE_NO_PAD.encode(self.clock.now().timestamp().to_be_bytes());
        let tag = self.tag(&id_segment, &issued_segment);
        format!(
            "{TOKEN_PREFIX}.{id_segment}.{issued_segment}.{}",
            URL_SAFE_NO_PAD.encode(tag)
        )
    }

    /// Check a token's structure, tag and age, and return the identifier it names.
    ///
    /// # Errors
    ///
    /// [`TrackerError::Invalid`] for anything malformed, forged or expired.
    pub fn decode(&self, token: &str) -> Result<Identifier, TrackerError> {
        let mut segments = token.trim().split('.');
        let (Some(prefix), Some(id_segment), Some(issued_segment), Some(tag_segment), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TrackerError::invalid("malformed token"));
        };

        if prefix != TOKEN_PREFIX {
            return Err(TrackerError::invalid("unknown token version"));
        }

        let tag = URL_SAFE_NO_PAD
            .decode(tag_segment)
            .map_err(|_| TrackerError::invalid("malformed tag"))?;
        let expected = self.tag(id_segment, issued_segment);
        if !constant_time_eq::constant_time_eq(&tag, &expected) {
            return Err(TrackerError::invalid("signature mismatch"));
        }

        let issued: [u8; 8] = URL_SAFE_NO_PAD
            .decode(issued_segment)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| TrackerError::invalid("malformed issue time"))?;
        self.check_age(i64::from_be_bytes(issued))?;

        let identifier = URL_SAFE_NO_PAD
            .decode(id_segment)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| TrackerError::invalid("malformed identifier"))?;

        Ok(Identifier::new(identifier))
    }

    /// Decode a token and resolve it to a live attendee.
    ///
    /// # Errors
    ///
    /// [`TrackerError::Invalid`] when the token does not decode or names no
    /// current attendee; store failures pass through.
    pub async fn verify(
        &self,
        token: &str,
        registry: &RegistryHandle,
    ) -> Result<Attendee, TrackerError> {
        let identifier = self.decode(token)?;
        registry
            .get(identifier.as_str())
            .await
            .map_err(|err| match err {
                TrackerError::NotFound { .. } => TrackerError::invalid("no such attendee"),
                other => other,
            })
    }

    fn check_age(&self, issued_secs: i64) -> Result<(), TrackerError> {
        let Some(max_age) = self.max_age else {
            return Ok(());
        };
        let age = self.clock.now().timestamp().saturating_sub(issued_secs);
        let max_age = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        if age > max_age {
            return Err(TrackerError::invalid("token expired"));
        }
        Ok(())
    }

    fn tag(&self, id_segment: &str, issued_segment: &str) -> [u8; TAG_LEN] {
        let digest = Sha256::new()
            .chain_update(&self.secret)
            .chain_update(b".")
            .chain_update(id_segment.as_bytes())
            .chain_update(b".")
            .chain_update(issued_segment.as_bytes())
            .finalize();
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&digest[..TAG_LEN]);
        tag
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::registry::{RegistryEnvironment, RegistryReducer, RegistryState, RegistryStore};
    use crate::types::AttendeeDraft;
    use chrono::Duration as ChronoDuration;
    use event_tracker_testing::mocks::{test_clock, FixedClock, SequentialIdGenerator};

    fn registry() -> RegistryHandle {
        let environment = RegistryEnvironment::new(
            Arc::new(test_clock()),
            Arc::new(SequentialIdGenerator::new()),
        );
        let store = Arc::new(RegistryStore::new(
            RegistryState::default(),
            RegistryReducer::new(),
            environment,
        ));
        RegistryHandle::new(store, Duration::from_secs(5))
    }

    fn service() -> TokenService {
        TokenService::new("test-secret", Arc::new(test_clock()))
    }

    fn id() -> Identifier {
        Identifier::new("ABCDEF0123456789")
    }

    #[test]
    fn issued_tokens_decode_to_their_identifier() {
        let service = service();
        let token = service.issue(&id());

        assert!(token.starts_with("ETK1."));
        assert!(token.bytes().all(|b| b.is_ascii_alphanumeric() || b"._-".contains(&b)));
        assert_eq!(service.decode(&token).unwrap(), id());
    }

    #[test]
    fn issue_is_deterministic_for_a_fixed_clock() {
        let service = service();
        assert_eq!(service.issue(&id()), service.issue(&id()));
    }

    #[test]
    fn tampered_identifier_is_rejected() {
        let service = service();
        let token = service.issue(&id());
        let forged_id = URL_SAFE_NO_PAD.encode("ZZZZZZZZZZZZZZZZ");

        let mut segments: Vec<&str> = token.split('.').collect();
        segments[1] = &forged_id;
        let forged = segments.join(".");

        assert!(matches!(service.decode(&forged), Err(TrackerError::Invalid { .. })));
    }

    #[test]
    fn other_secrets_are_rejected() {
        let token = service().issue(&id());
        let other = TokenService::new("other-secret", Arc::new(test_clock()));
        assert!(other.decode(&token).is_err());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let service = service();
        for token in ["", "ETK1", "ETK1.a.b", "ETK2.a.b.c", "ETK1.a.b.c.d", "not a token"] {
            assert!(
                matches!(service.decode(token), Err(TrackerError::Invalid { .. })),
                "{token}"
            );
        }
    }

    #[test]
    fn max_age_rejects_old_tokens() {
        let issued_at = test_clock().now();
        let token = service().issue(&id());

        let later = |secs| {
            TokenService::new(
                "test-secret",
                Arc::new(FixedClock::new(issued_at + ChronoDuration::seconds(secs))),
            )
            .with_max_age(Some(Duration::from_secs(60)))
        };

        assert!(later(60).decode(&token).is_ok());
        assert!(later(61).decode(&token).is_err());
    }

    #[tokio::test]
    async fn verify_resolves_live_attendees() {
        let registry = registry();
        let ada = registry
            .create(AttendeeDraft {
                name: "Ada".to_string(),
                email: "ada@x.io".to_string(),
                role: None,
                phone_number: None,
            })
            .await
            .unwrap();

        let token = service().issue(&ada.identifier);
        assert_eq!(service().verify(&token, &registry).await.unwrap(), ada);
    }

    #[tokio::test]
    async fn well_signed_token_for_an_unknown_identifier_is_invalid() {
        let registry = registry();
        let token = service().issue(&Identifier::new("NEVEREXISTED0000"));

        // The token itself is sound; only the lookup fails
        assert_eq!(service().decode(&token).unwrap().as_str(), "NEVEREXISTED0000");
        assert_eq!(
            service().verify(&token, &registry).await,
            Err(TrackerError::invalid("no such attendee"))
        );
    }
}
