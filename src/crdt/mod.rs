//! CRDT (Conflict-free Replicated Data Type) implementation module.
//!
//! This module contains the LWW element dictionary and all its supporting
//! types: the state container, merge engine, snapshot codec and a shared
//! handle for multi-threaded callers.

pub mod codec;
pub mod dict;
pub mod merge;
pub mod shared;
pub mod types;

// Re-export the main public API
pub use codec::{AddEntry, RemoveEntry, Snapshot};
pub use dict::{Iter, LwwDict};
pub use merge::merge_all;
pub use shared::SharedDict;
pub use types::{AddRecord, Bias, DictConfig, LamportClock, ReplicaId, WallClock};
