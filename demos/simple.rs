//! Simple standalone example of LWW dictionary usage.
//!
//! Two users edit a shared settings map while offline, then exchange state.
//!
//! Run with: cargo run --example simple

use lww_dict::{Bias, LamportClock, LwwDict};

type Settings = LwwDict<String, String, u64>;

fn show(name: &str, dict: &Settings) {
    let entries: Vec<String> = dict.iter().map(|(k, v)| format!("{k}={v}")).collect();
    println!("  {name}: {{{}}}", entries.join(", "));
}

fn main() {
    println!("=== Simple LWW Dictionary Example ===\n");

    let clock = LamportClock::new();
    let mut alice = Settings::with_replica_id(Bias::AddWins, "alice");
    let mut bob = Settings::with_replica_id(Bias::AddWins, "bob");

    // Shared starting point
    alice.add("theme".to_string(), "light".to_string(), clock.tick());
    alice.add("font".to_string(), "serif".to_string(), clock.tick());
    bob = bob.merge(&alice);

    println!("--- Before going offline ---");
    show("Alice", &alice);
    show("Bob", &bob);

    // Concurrent offline edits
    let t = clock.tick();
    alice.update("theme".to_string(), "dark".to_string(), t);
    bob.remove("font".to_string(), t);
    bob.add("lang".to_string(), "en".to_string(), clock.tick());

    println!("\n--- Offline edits ---");
    show("Alice", &alice);
    show("Bob", &bob);

    // Exchange state in both directions
    let alice_view = alice.merge(&bob);
    let bob_view = bob.merge(&alice);

    println!("\n--- After synchronization ---");
    show("Alice", &alice_view);
    show("Bob", &bob_view);

    if alice_view.add_history() == bob_view.add_history()
        && alice_view.remove_history() == bob_view.remove_history()
    {
        println!("\n✓ Both replicas converged");
    } else {
        println!("\n✗ Replicas diverged");
    }

    // The tombstone travels with the state
    match alice_view.encode_pretty() {
        Ok(text) => println!("\n--- Alice's snapshot ---\n{text}"),
        Err(err) => println!("\nfailed to encode snapshot: {err}"),
    }
}
