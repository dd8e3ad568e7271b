//! Participant identities.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable per-client identity.
///
/// A UUIDv4 (122 bits of entropy) generated once per profile and reused
/// across sessions. Construction takes caller-supplied randomness so that
/// simulation runs stay deterministic while production uses OS entropy.
///
/// Serialized on the wire as the canonical hyphenated string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Build an identity from 16 random bytes.
    ///
    /// The version and variant bits are forced to UUIDv4, so two byte
    /// arrays differing only there map to the same identity.
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    /// Parse an identity from its hyphenated string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
