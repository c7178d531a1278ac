//! # LWW Dict - Last-Write-Wins Element Dictionary
//!
//! A state-based Conflict-free Replicated Data Type (CRDT) implementing a
//! key-value map. Independent replicas accept adds, removes and updates
//! without coordination and later combine their states with `merge`, which
//! converges to the same result regardless of merge order, grouping or
//! duplication.
//!
//! ## Features
//!
//! - **Dual history**: the latest add and the latest remove are kept per key;
//!   visibility is derived from both plus a configurable add/remove bias
//! - **Deterministic merge**: equal timestamps resolve by writer identity,
//!   then by value text, so every replica picks the same winner
//! - **Mergeable snapshots**: encoding keeps tombstones and writer
//!   identities, so a reloaded replica can still merge with its peers
//! - **Value semantics**: merge never mutates its operands and clones never
//!   share storage
//!
//! ## Example
//!
//! ```rust
//! use lww_dict::{Bias, LwwDict};
//!
//! let mut alice: LwwDict<String, String, u64> = LwwDict::with_replica_id(Bias::AddWins, "alice");
//! let mut bob: LwwDict<String, String, u64> = LwwDict::with_replica_id(Bias::AddWins, "bob");
//!
//! alice.add("color".to_string(), "red".to_string(), 1);
//! bob.remove("color".to_string(), 2);
//!
//! let merged = alice.merge(&bob);
//! assert_eq!(merged.lookup("color"), None);
//! assert_eq!(merged.add_history(), bob.merge(&alice).add_history());
//! ```

pub mod crdt;
pub mod error;

// Re-export the main public API from the CRDT module
pub use crdt::{AddEntry, AddRecord, RemoveEntry, Snapshot};
pub use crdt::{Bias, DictConfig, LamportClock, ReplicaId, WallClock};
pub use crdt::{Iter, LwwDict, SharedDict, merge_all};
pub use error::{CodecError, DecodeError};
