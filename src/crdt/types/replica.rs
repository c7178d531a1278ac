//! Replica identifier type and related functionality.
//!
//! This module contains the definition of ReplicaId, the opaque identity each
//! dictionary replica stamps onto the writes it performs.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque identifier for a replica in the distributed system.
///
/// The identifier only serves as a deterministic tie-break source when two
/// writes carry the same timestamp. It has no liveness, ownership or
/// authentication meaning.
///
/// # Ordering
///
/// Identifiers are totally ordered by the lexicographic order of their string
/// form. Randomly generated identifiers use the canonical lowercase hyphenated
/// UUID text, so they compare the same way on every replica.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicaId(String);

impl ReplicaId {
    /// Creates a replica identifier from an explicit value
    pub fn new(id: impl Into<String>) -> Self {
        ReplicaId(id.into())
    }

    /// Generates a fresh random identifier (v4 UUID)
    pub fn random() -> Self {
        ReplicaId::from(Uuid::new_v4())
    }

    /// Gets the string form used for ordering
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ReplicaId {
    fn default() -> Self {
        ReplicaId::random()
    }
}

impl From<Uuid> for ReplicaId {
    fn from(uuid: Uuid) -> Self {
        ReplicaId(uuid.hyphenated().to_string())
    }
}

impl From<&str> for ReplicaId {
    fn from(id: &str) -> Self {
        ReplicaId::new(id)
    }
}

impl From<String> for ReplicaId {
    fn from(id: String) -> Self {
        ReplicaId(id)
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
