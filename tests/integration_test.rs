//! Integration tests for the LWW dictionary.
//!
//! These tests drive several replicas through realistic edit/sync sequences
//! and check that they converge, that removals stick, and that snapshots
//! reload into mergeable state.

use lww_dict::{Bias, LamportClock, LwwDict, ReplicaId, merge_all};

type Dict = LwwDict<String, String, u64>;

fn replica(id: &str) -> Dict {
    LwwDict::with_replica_id(Bias::AddWins, id)
}

fn s(text: &str) -> String {
    text.to_string()
}

#[test]
fn test_basic_dict_operations() {
    let mut d = replica("A");
    assert!(d.is_empty());

    d.add(s("a"), s("1"), 1);
    d.add(s("b"), s("2"), 2);
    d.add(s("c"), s("3"), 3);
    assert_eq!(d.len(), 3);

    d.remove(s("b"), 4);
    assert_eq!(d.len(), 2);
    assert_eq!(d.lookup("b"), None);
    assert_eq!(d.add_history().len(), 3);

    assert!(d.update(s("a"), s("10"), 5));
    assert!(!d.update(s("b"), s("20"), 5));
    assert_eq!(d.lookup("a"), Some(&s("10")));
}

#[test]
fn test_reinsertion() {
    let mut d = replica("A");
    d.add(s("k"), s("v1"), 1);
    d.remove(s("k"), 2);
    d.add(s("k"), s("v2"), 3);
    assert_eq!(d.lookup("k"), Some(&s("v2")));
}

#[test]
fn test_stale_add_rejected() {
    let mut d = replica("A");
    d.add(s("k"), s("new"), 5);
    d.add(s("k"), s("old"), 2);
    assert_eq!(d.lookup("k"), Some(&s("new")));
}

#[test]
fn test_bias_at_exact_tie() {
    for (bias, expected) in [(Bias::AddWins, Some(s("v"))), (Bias::RemoveWins, None)] {
        let mut d: Dict = LwwDict::with_replica_id(bias, "A");
        d.add(s("k"), s("v"), 5);
        d.remove(s("k"), 5);
        assert_eq!(d.lookup("k").cloned(), expected);
    }
}

#[test]
fn test_equal_timestamp_add_race() {
    let mut a = replica("A");
    let mut b = replica("B");
    a.add(s("k"), s("from-a"), 7);
    b.add(s("k"), s("from-b"), 7);

    let ab = a.merge(&b);
    let ba = b.merge(&a);

    assert_eq!(ab.lookup("k"), Some(&s("from-b")));
    assert_eq!(ba.lookup("k"), Some(&s("from-b")));
    assert_eq!(ab.add_history(), ba.add_history());
    assert_eq!(ab.add_history()["k"].source_replica_id, ReplicaId::new("B"));
}

#[test]
fn test_source_replica_survives_relay() {
    // B learns A's write, then C merges from B only
    let mut a = replica("A");
    a.add(s("k"), s("from-a"), 3);
    let b = replica("B").merge(&a);
    let c = replica("C").merge(&b);

    assert_eq!(c.add_history()["k"].source_replica_id, ReplicaId::new("A"));
}

#[test]
fn test_concurrent_replicas_convergence() {
    let mut a = replica("A");
    let mut b = replica("B");
    let mut c = replica("C");

    a.add(s("title"), s("draft"), 1);
    b.add(s("title"), s("final"), 2);
    c.remove(s("title"), 2);
    a.add(s("owner"), s("ann"), 1);
    c.add(s("tags"), s("crdt"), 4);
    b.remove(s("tags"), 3);

    let orders = [
        merge_all([&a, &b, &c]).unwrap(),
        merge_all([&c, &a, &b]).unwrap(),
        merge_all([&b, &c, &a]).unwrap(),
    ];

    for merged in &orders {
        // title: add@2 vs remove@2 under add-wins stays visible
        assert_eq!(merged.lookup("title"), Some(&s("final")));
        assert_eq!(merged.lookup("owner"), Some(&s("ann")));
        assert_eq!(merged.lookup("tags"), Some(&s("crdt")));
        assert_eq!(merged.add_history(), orders[0].add_history());
        assert_eq!(merged.remove_history(), orders[0].remove_history());
    }
}

#[test]
fn test_remove_is_not_undone_by_stale_replica() {
    let mut a = replica("A");
    a.add(s("k"), s("v"), 1);

    let mut b = a.clone();
    b.remove(s("k"), 2);

    // A keeps its old view; syncing in either direction hides the key
    assert_eq!(a.merge(&b).lookup("k"), None);
    assert_eq!(b.merge(&a).lookup("k"), None);
}

#[test]
fn test_snapshot_reload_still_merges() {
    let mut a = replica("A");
    a.add(s("x"), s("1"), 1);
    a.remove(s("x"), 3);
    a.add(s("y"), s("2"), 2);

    let reloaded = Dict::decode(&a.encode().unwrap()).unwrap();
    assert_eq!(reloaded, a);
    assert_eq!(reloaded.keys().collect::<Vec<_>>(), vec!["y"]);

    // A peer holding an older add of x must not resurrect it
    let mut peer = replica("B");
    peer.add(s("x"), s("stale"), 2);
    assert_eq!(reloaded.merge(&peer).lookup("x"), None);
    assert_eq!(
        reloaded.merge(&peer).add_history(),
        a.merge(&peer).add_history()
    );
}

#[test]
fn test_lamport_clock_drives_replicas() {
    let clock_a = LamportClock::new();
    let clock_b = LamportClock::new();
    let mut a = replica("A");
    let mut b = replica("B");

    a.add(s("k"), s("a1"), clock_a.tick());
    a.add(s("k"), s("a2"), clock_a.tick());

    // B syncs, observes A's clock, and writes after it
    b = b.merge(&a);
    clock_b.observe(clock_a.current());
    assert!(b.update(s("k"), s("b1"), clock_b.tick()));

    let merged = a.merge(&b);
    assert_eq!(merged.lookup("k"), Some(&s("b1")));
}
