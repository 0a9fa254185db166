//! Random attendee identifiers.
//!
//! Identifiers are 16 characters drawn uniformly from `A-Z0-9`, which gives
//! 36^16 (about 7.9 × 10^24) values. Candidates are checked against the
//! registry by the reducer before they are accepted.

use event_tracker_core::environment::IdentifierGenerator;
use rand::Rng;

/// Characters an identifier may contain.
pub const IDENTIFIER_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of every generated identifier.
pub const IDENTIFIER_LEN: usize = 16;

/// Production generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdentifierGenerator;

impl IdentifierGenerator for RandomIdentifierGenerator {
    fn next_identifier(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..IDENTIFIER_LEN)
            .map(|_| char::from(IDENTIFIER_ALPHABET[rng.gen_range(0..IDENTIFIER_ALPHABET.len())]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identifiers_use_the_alphabet_and_length() {
        let generator = RandomIdentifierGenerator;
        for _ in 0..100 {
            let id = generator.next_identifier();
            assert_eq!(id.len(), IDENTIFIER_LEN);
            assert!(id.bytes().all(|b| IDENTIFIER_ALPHABET.contains(&b)), "{id}");
        }
    }

    #[test]
    fn identifiers_do_not_repeat_in_practice() {
        let generator = RandomIdentifierGenerator;
        let ids: HashSet<String> = (0..10_000).map(|_| generator.next_identifier()).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
