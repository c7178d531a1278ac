//! Type definitions for the LWW dictionary.
//!
//! This module contains the small value types used throughout the dictionary,
//! organized into focused submodules.

pub mod bias;
pub mod clock;
pub mod config;
pub mod record;
pub mod replica;

pub use bias::Bias;
pub use clock::{LamportClock, WallClock};
pub use config::DictConfig;
pub use record::AddRecord;
pub use replica::ReplicaId;
