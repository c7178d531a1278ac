//! Several replicas on worker threads, merged in arbitrary orders.
//!
//! Each worker owns its own replica and writes with a shared Lamport clock.
//! The main thread then merges the snapshots in every rotation and checks that
//! all orders agree.
//!
//! Run with: RUST_LOG=debug cargo run --example offline_replicas

use std::sync::Arc;
use std::thread;

use lww_dict::{Bias, LamportClock, LwwDict, merge_all};
use tracing::info;
use tracing_subscriber::EnvFilter;

type Inventory = LwwDict<String, u32, u64>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let clock = Arc::new(LamportClock::new());
    let workers: Vec<_> = ["north", "south", "east", "west"]
        .into_iter()
        .enumerate()
        .map(|(w, name)| {
            let clock = Arc::clone(&clock);
            thread::spawn(move || {
                let mut replica = Inventory::with_replica_id(Bias::RemoveWins, name);
                for i in 0..20u32 {
                    let item = format!("item-{}", (i + w as u32) % 8);
                    if i % 5 == 4 {
                        replica.remove(item, clock.tick());
                    } else {
                        replica.add(item, i * 10 + w as u32, clock.tick());
                    }
                }
                info!(replica = name, visible = replica.len(), "worker finished");
                replica
            })
        })
        .collect();

    let replicas: Vec<Inventory> = workers
        .into_iter()
        .map(|handle| handle.join().expect("worker panicked"))
        .collect();

    let mut results = Vec::new();
    for shift in 0..replicas.len() {
        let mut order: Vec<&Inventory> = replicas.iter().collect();
        order.rotate_left(shift);
        if let Some(merged) = merge_all(order) {
            results.push(merged);
        }
    }

    let reference = &results[0];
    let converged = results.iter().all(|merged| {
        merged.add_history() == reference.add_history()
            && merged.remove_history() == reference.remove_history()
    });

    println!("visible items after merge:");
    for (item, qty) in reference {
        println!("  {item}: {qty}");
    }
    println!(
        "tombstoned: {:?}",
        reference.tombstoned_keys().collect::<Vec<_>>()
    );
    println!("all merge orders converged: {converged}");
}
