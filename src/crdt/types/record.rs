//! The add-history record stored per key.

use crate::crdt::types::replica::ReplicaId;

/// The latest add (or update) known for a key.
///
/// `source_replica_id` names the replica that performed the write, not the
/// replica currently holding the record. It travels unchanged through merges
/// and snapshots so that equal-timestamp ties resolve the same way everywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRecord<V, T> {
    /// The value written
    pub value: V,
    /// The timestamp supplied by the writer
    pub timestamp: T,
    /// The identity of the writing replica
    pub source_replica_id: ReplicaId,
}

impl<V, T> AddRecord<V, T> {
    /// Creates a new add record
    pub fn new(value: V, timestamp: T, source_replica_id: ReplicaId) -> Self {
        AddRecord {
            value,
            timestamp,
            source_replica_id,
        }
    }
}
