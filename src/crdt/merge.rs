//! Merge engine for the LWW dictionary.
//!
//! Merging folds the other replica's histories into a copy of this replica's
//! histories, key by key. Adds resolve with a tie-break chain over
//! `(timestamp, source replica, value text)`; tombstones resolve with a plain
//! maximum. Both rules are total orders, which makes merge commutative,
//! associative and idempotent.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Serialize;
use tracing::{debug, warn};

use crate::crdt::dict::LwwDict;
use crate::crdt::types::AddRecord;

impl<K, V, T> LwwDict<K, V, T>
where
    K: Ord + Clone,
    V: Clone + Serialize,
    T: Ord + Clone,
{
    /// Combines this state with `other` into a new state.
    ///
    /// Neither operand is modified. The result inherits this replica's bias
    /// and identity. Operands with different biases are merged anyway, but the
    /// mismatch is logged since replicas would then disagree on visibility.
    pub fn merge(&self, other: &Self) -> Self {
        if self.bias != other.bias {
            warn!(
                local = %self.replica_id,
                remote = %other.replica_id,
                local_bias = ?self.bias,
                remote_bias = ?other.bias,
                "merging replicas with different biases; keeping the local bias"
            );
        }

        let mut add_history = self.add_history.clone();
        for (key, record) in &other.add_history {
            fold_add(&mut add_history, key.clone(), record.clone());
        }

        let mut remove_history = self.remove_history.clone();
        for (key, timestamp) in &other.remove_history {
            fold_remove(&mut remove_history, key.clone(), timestamp.clone());
        }

        debug!(
            local = %self.replica_id,
            remote = %other.replica_id,
            adds = add_history.len(),
            tombstones = remove_history.len(),
            "merged replica state"
        );

        LwwDict {
            add_history,
            remove_history,
            bias: self.bias,
            replica_id: self.replica_id.clone(),
        }
    }
}

/// Merges any number of states into a fresh accumulator.
///
/// The first state seeds the accumulator (and so decides its bias and
/// identity). Returns `None` for an empty input.
pub fn merge_all<'a, K, V, T, I>(states: I) -> Option<LwwDict<K, V, T>>
where
    K: Ord + Clone + 'a,
    V: Clone + Serialize + 'a,
    T: Ord + Clone + 'a,
    I: IntoIterator<Item = &'a LwwDict<K, V, T>>,
{
    let mut states = states.into_iter();
    let first = states.next()?.clone();
    Some(states.fold(first, |acc, state| acc.merge(state)))
}

/// Returns true if `candidate` should replace `incumbent`.
///
/// Only a strict win replaces, so a record never displaces an identical copy
/// of itself.
pub(crate) fn supersedes<V, T>(candidate: &AddRecord<V, T>, incumbent: &AddRecord<V, T>) -> bool
where
    V: Serialize,
    T: Ord,
{
    let order = candidate
        .timestamp
        .cmp(&incumbent.timestamp)
        .then_with(|| {
            candidate
                .source_replica_id
                .cmp(&incumbent.source_replica_id)
        })
        .then_with(|| canonical_text(&candidate.value).cmp(&canonical_text(&incumbent.value)));

    order == Ordering::Greater
}

/// Folds one add record into a history using the tie-break chain.
///
/// Returns true if the key already had a record.
pub(crate) fn fold_add<K, V, T>(
    history: &mut BTreeMap<K, AddRecord<V, T>>,
    key: K,
    record: AddRecord<V, T>,
) -> bool
where
    K: Ord,
    V: Serialize,
    T: Ord,
{
    match history.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(record);
            false
        }
        Entry::Occupied(mut slot) => {
            if supersedes(&record, slot.get()) {
                slot.insert(record);
            }
            true
        }
    }
}

/// Folds one tombstone into a history, keeping the latest timestamp.
///
/// Returns true if the key already had a tombstone.
pub(crate) fn fold_remove<K, T>(history: &mut BTreeMap<K, T>, key: K, timestamp: T) -> bool
where
    K: Ord,
    T: Ord,
{
    match history.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(timestamp);
            false
        }
        Entry::Occupied(mut slot) => {
            if timestamp > *slot.get() {
                slot.insert(timestamp);
            }
            true
        }
    }
}

/// The canonical textual form of a value: its compact JSON encoding, with
/// object keys in sorted order.
///
/// Going through `serde_json::Value` sorts map keys, so values such as a
/// `HashMap` render the same text on every replica regardless of iteration
/// order. Strings are compared in their JSON-escaped form.
fn canonical_text<V: Serialize>(value: &V) -> String {
    let rendered = serde_json::to_value(value).and_then(|tree| serde_json::to_string(&tree));
    match rendered {
        Ok(text) => text,
        // `Value` cannot hold integers wider than 64 bits; those serialize
        // directly and contain no maps to reorder.
        Err(_) => match serde_json::to_string(value) {
            Ok(text) => text,
            Err(err) => {
                // Only reachable for values JSON cannot express. Such values
                // all tie on this rule.
                warn!(error = %err, "value has no canonical text form");
                String::new()
            }
        },
    }
}
