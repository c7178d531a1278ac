//! Core LWW dictionary implementation.
//!
//! This module contains the `LwwDict` state container, its three mutations and
//! the visibility rule every read view is derived from. Merging lives in
//! `merge.rs` and snapshots in `codec.rs`.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::collections::btree_map;

use tracing::trace;

use crate::crdt::types::{AddRecord, Bias, DictConfig, ReplicaId};

/// A Last-Write-Wins element dictionary.
///
/// The dictionary keeps two independent histories: the latest add per key and
/// the latest remove (tombstone) per key. Whether a key is currently present is
/// never stored; it is derived on every read from the two histories and the
/// bias.
///
/// # Design
///
/// - One add record and one tombstone per key, overwritten in place
/// - Writes older than the stored timestamp are dropped silently
/// - Ordered maps so iteration never depends on hash order
/// - Plain value semantics: clones are fully independent replicas of the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LwwDict<K, V, T> {
    pub(crate) add_history: BTreeMap<K, AddRecord<V, T>>,
    pub(crate) remove_history: BTreeMap<K, T>,
    pub(crate) bias: Bias,
    pub(crate) replica_id: ReplicaId,
}

impl<K, V, T> LwwDict<K, V, T>
where
    K: Ord + Clone,
    V: Clone,
    T: Ord + Clone,
{
    /// Creates an empty add-wins dictionary with a random replica identity.
    pub fn new() -> Self {
        Self::with_config(DictConfig::default())
    }

    /// Creates an empty dictionary with the given bias and a random identity.
    pub fn with_bias(bias: Bias) -> Self {
        Self::with_config(DictConfig::default().with_bias(bias))
    }

    /// Creates an empty dictionary with an explicit replica identity.
    pub fn with_replica_id(bias: Bias, replica_id: impl Into<ReplicaId>) -> Self {
        Self::with_config(
            DictConfig::default()
                .with_bias(bias)
                .with_replica_id(replica_id),
        )
    }

    /// Creates an empty dictionary from construction options.
    pub fn with_config(config: DictConfig) -> Self {
        LwwDict {
            add_history: BTreeMap::new(),
            remove_history: BTreeMap::new(),
            bias: config.bias,
            replica_id: config.replica_id.unwrap_or_else(ReplicaId::random),
        }
    }

    /// Records an add of `key` with `value` at `timestamp`.
    ///
    /// The add is dropped if the stored add for `key` is strictly newer.
    /// Otherwise it replaces the stored record, stamped with this replica's
    /// identity.
    pub fn add(&mut self, key: K, value: V, timestamp: T) {
        if let Some(existing) = self.add_history.get(&key) {
            if existing.timestamp > timestamp {
                trace!(replica = %self.replica_id, "ignoring stale add");
                return;
            }
        }

        let record = AddRecord::new(value, timestamp, self.replica_id.clone());
        self.add_history.insert(key, record);
    }

    /// Records a removal of `key` at `timestamp`.
    ///
    /// Only a tombstone is written; the add record stays in place so that a
    /// later merge can still compare against it.
    pub fn remove(&mut self, key: K, timestamp: T) {
        if let Some(existing) = self.remove_history.get(&key) {
            if *existing > timestamp {
                trace!(replica = %self.replica_id, "ignoring stale remove");
                return;
            }
        }

        self.remove_history.insert(key, timestamp);
    }

    /// Overwrites the value of a key that is currently visible.
    ///
    /// Returns `false` and applies nothing if `key` is absent or its stored
    /// add is newer than `timestamp`. Otherwise behaves exactly like `add`.
    pub fn update(&mut self, key: K, value: V, timestamp: T) -> bool {
        if self.lookup(&key).is_none() {
            trace!(replica = %self.replica_id, "rejecting update of absent key");
            return false;
        }

        let stale = self
            .add_history
            .get(&key)
            .is_some_and(|existing| existing.timestamp > timestamp);
        if stale {
            trace!(replica = %self.replica_id, "rejecting stale update");
            return false;
        }

        self.add(key, value, timestamp);
        true
    }
}

impl<K, V, T> LwwDict<K, V, T>
where
    K: Ord,
    T: Ord,
{
    /// Returns the current value of `key`, or `None` if it is absent.
    pub fn lookup<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let record = self.add_history.get(key)?;
        match self.remove_history.get(key) {
            None => Some(&record.value),
            Some(removed_at) if self.bias.keeps(&record.timestamp, removed_at) => {
                Some(&record.value)
            }
            Some(_) => None,
        }
    }

    /// Alias of [`LwwDict::lookup`].
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lookup(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.lookup(key).is_some()
    }

    /// Iterates visible entries in key order.
    pub fn iter(&self) -> Iter<'_, K, V, T> {
        Iter {
            dict: self,
            candidates: self.add_history.iter(),
        }
    }

    /// Iterates visible keys in key order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Iterates the values of visible keys, in key order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Number of visible keys.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if no key is visible. Stops at the first visible key.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Keys in the add history that a tombstone currently hides.
    ///
    /// These are the candidates an external garbage-collection policy may
    /// consider; the dictionary itself never drops history. Tombstones for
    /// keys that were never added are not listed; see `remove_history`.
    pub fn tombstoned_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.add_history
            .keys()
            .filter(move |key| self.lookup(*key).is_none())
    }

    /// The raw add history, one record per key.
    pub fn add_history(&self) -> &BTreeMap<K, AddRecord<V, T>> {
        &self.add_history
    }

    /// The raw remove history, one tombstone timestamp per key.
    pub fn remove_history(&self) -> &BTreeMap<K, T> {
        &self.remove_history
    }
}

impl<K, V, T> LwwDict<K, V, T> {
    pub fn bias(&self) -> Bias {
        self.bias
    }

    pub fn replica_id(&self) -> &ReplicaId {
        &self.replica_id
    }
}

impl<K, V, T> Default for LwwDict<K, V, T>
where
    K: Ord + Clone,
    V: Clone,
    T: Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the visible entries of an [`LwwDict`].
///
/// Walks the add history and keeps only the keys `lookup` reports as present.
pub struct Iter<'a, K, V, T> {
    dict: &'a LwwDict<K, V, T>,
    candidates: btree_map::Iter<'a, K, AddRecord<V, T>>,
}

impl<'a, K, V, T> Iterator for Iter<'a, K, V, T>
where
    K: Ord,
    T: Ord,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for (key, _) in self.candidates.by_ref() {
            if let Some(value) = self.dict.lookup(key) {
                return Some((key, value));
            }
        }
        None
    }
}

impl<'a, K, V, T> IntoIterator for &'a LwwDict<K, V, T>
where
    K: Ord,
    T: Ord,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Dict = LwwDict<String, String, u64>;

    fn dict(bias: Bias) -> Dict {
        LwwDict::with_replica_id(bias, "A")
    }

    #[test]
    fn test_dict_creation() {
        let d = Dict::new();
        assert_eq!(d.bias(), Bias::AddWins);
        assert!(d.is_empty());
        assert_eq!(d.len(), 0);
        assert!(d.add_history().is_empty());
        assert!(d.remove_history().is_empty());
        assert_ne!(d.replica_id(), Dict::new().replica_id());
    }

    #[test]
    fn test_add_and_lookup() {
        let mut d = dict(Bias::AddWins);
        d.add("k".to_string(), "v".to_string(), 1);
        assert_eq!(d.lookup("k"), Some(&"v".to_string()));
        assert_eq!(d.get("missing"), None);
        assert!(d.contains_key("k"));
    }

    #[test]
    fn test_add_stamps_own_replica_id() {
        let mut d = dict(Bias::AddWins);
        d.add("k".to_string(), "v".to_string(), 1);
        assert_eq!(d.add_history()["k"].source_replica_id, ReplicaId::new("A"));
    }

    #[test]
    fn test_stale_add_is_ignored() {
        let mut d = dict(Bias::AddWins);
        d.add("k".to_string(), "new".to_string(), 5);
        d.add("k".to_string(), "old".to_string(), 2);
        assert_eq!(d.lookup("k"), Some(&"new".to_string()));
        assert_eq!(d.add_history()["k"].timestamp, 5);
    }

    #[test]
    fn test_equal_timestamp_add_overwrites() {
        let mut d = dict(Bias::AddWins);
        d.add("k".to_string(), "first".to_string(), 5);
        d.add("k".to_string(), "second".to_string(), 5);
        assert_eq!(d.lookup("k"), Some(&"second".to_string()));
    }

    #[test]
    fn test_remove_keeps_add_record() {
        let mut d = dict(Bias::AddWins);
        d.add("k".to_string(), "v".to_string(), 1);
        d.remove("k".to_string(), 2);
        assert_eq!(d.lookup("k"), None);
        assert!(d.add_history().contains_key("k"));
        assert_eq!(d.remove_history()["k"], 2);
    }

    #[test]
    fn test_stale_remove_is_ignored() {
        let mut d = dict(Bias::AddWins);
        d.remove("k".to_string(), 9);
        d.remove("k".to_string(), 3);
        assert_eq!(d.remove_history()["k"], 9);
    }

    #[test]
    fn test_reinsertion_after_remove() {
        let mut d = dict(Bias::AddWins);
        d.add("k".to_string(), "v1".to_string(), 1);
        d.remove("k".to_string(), 2);
        d.add("k".to_string(), "v2".to_string(), 3);
        assert_eq!(d.lookup("k"), Some(&"v2".to_string()));
    }

    #[test]
    fn test_bias_at_exact_tie() {
        let mut add_wins = dict(Bias::AddWins);
        add_wins.add("k".to_string(), "v".to_string(), 5);
        add_wins.remove("k".to_string(), 5);
        assert_eq!(add_wins.lookup("k"), Some(&"v".to_string()));

        let mut remove_wins = dict(Bias::RemoveWins);
        remove_wins.add("k".to_string(), "v".to_string(), 5);
        remove_wins.remove("k".to_string(), 5);
        assert_eq!(remove_wins.lookup("k"), None);
    }

    #[test]
    fn test_update_requires_visible_key() {
        let mut d = dict(Bias::AddWins);
        assert!(!d.update("k".to_string(), "v".to_string(), 1));
        assert!(d.add_history().is_empty());

        d.add("k".to_string(), "v".to_string(), 1);
        d.remove("k".to_string(), 2);
        assert!(!d.update("k".to_string(), "w".to_string(), 3));
        assert_eq!(d.add_history()["k"].value, "v");
    }

    #[test]
    fn test_update_rejects_stale_timestamp() {
        let mut d = dict(Bias::AddWins);
        d.add("k".to_string(), "v".to_string(), 5);
        assert!(!d.update("k".to_string(), "w".to_string(), 4));
        assert_eq!(d.lookup("k"), Some(&"v".to_string()));

        assert!(d.update("k".to_string(), "w".to_string(), 5));
        assert_eq!(d.lookup("k"), Some(&"w".to_string()));
    }

    #[test]
    fn test_views_skip_tombstoned_keys() {
        let mut d = dict(Bias::AddWins);
        d.add("a".to_string(), "1".to_string(), 1);
        d.add("b".to_string(), "2".to_string(), 1);
        d.add("c".to_string(), "3".to_string(), 1);
        d.remove("b".to_string(), 2);

        assert_eq!(d.keys().cloned().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(d.values().cloned().collect::<Vec<_>>(), vec!["1", "3"]);
        assert_eq!(d.len(), 2);
        assert!(!d.is_empty());
        assert_eq!(
            (&d).into_iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
        assert_eq!(d.tombstoned_keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_tombstoned_keys_only_lists_added_keys() {
        let mut d = dict(Bias::AddWins);
        d.remove("never-added".to_string(), 3);
        d.add("hidden".to_string(), "v".to_string(), 1);
        d.remove("hidden".to_string(), 2);
        d.add("revived".to_string(), "v".to_string(), 5);
        d.remove("revived".to_string(), 4);

        assert_eq!(d.tombstoned_keys().collect::<Vec<_>>(), vec!["hidden"]);
        assert_eq!(d.remove_history().len(), 3);
    }

    #[test]
    fn test_is_empty_when_everything_removed() {
        let mut d = dict(Bias::RemoveWins);
        d.add("a".to_string(), "1".to_string(), 1);
        d.remove("a".to_string(), 1);
        assert!(d.is_empty());
        assert_eq!(d.add_history().len(), 1);
    }

    #[test]
    fn test_clones_are_independent() {
        let mut original = dict(Bias::AddWins);
        original.add("k".to_string(), "v".to_string(), 1);

        let mut copy = original.clone();
        copy.remove("k".to_string(), 2);

        assert_eq!(original.lookup("k"), Some(&"v".to_string()));
        assert_eq!(copy.lookup("k"), None);
    }
}
