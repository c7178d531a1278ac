//! Shared handle for callers that want several threads to own one replica.
//!
//! `LwwDict` itself holds no locks. This wrapper puts one replica behind a
//! `parking_lot::RwLock` so threads can write to it and fold in peer snapshots.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::crdt::dict::LwwDict;
use crate::crdt::types::{Bias, ReplicaId};

/// A cloneable, thread-safe handle to a single dictionary replica.
///
/// Clones of the handle share the same replica. Use [`SharedDict::snapshot`]
/// to obtain an independent copy of the state.
pub struct SharedDict<K, V, T> {
    inner: Arc<RwLock<LwwDict<K, V, T>>>,
}

impl<K, V, T> Clone for SharedDict<K, V, T> {
    fn clone(&self) -> Self {
        SharedDict {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, T> SharedDict<K, V, T>
where
    K: Ord + Clone,
    V: Clone + Serialize,
    T: Ord + Clone,
{
    pub fn new(dict: LwwDict<K, V, T>) -> Self {
        SharedDict {
            inner: Arc::new(RwLock::new(dict)),
        }
    }

    pub fn add(&self, key: K, value: V, timestamp: T) {
        self.inner.write().add(key, value, timestamp);
    }

    pub fn remove(&self, key: K, timestamp: T) {
        self.inner.write().remove(key, timestamp);
    }

    pub fn update(&self, key: K, value: V, timestamp: T) -> bool {
        self.inner.write().update(key, value, timestamp)
    }

    /// Returns a copy of the current value of `key`.
    pub fn lookup(&self, key: &K) -> Option<V> {
        self.inner.read().lookup(key).cloned()
    }

    /// Returns an independent copy of the replica state.
    pub fn snapshot(&self) -> LwwDict<K, V, T> {
        self.inner.read().clone()
    }

    /// Merges a peer's state into this replica.
    pub fn absorb(&self, other: &LwwDict<K, V, T>) {
        let mut guard = self.inner.write();
        let merged = guard.merge(other);
        *guard = merged;
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn bias(&self) -> Bias {
        self.inner.read().bias()
    }

    pub fn replica_id(&self) -> ReplicaId {
        self.inner.read().replica_id().clone()
    }
}
