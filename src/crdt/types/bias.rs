//! Add/remove bias used to settle exact timestamp ties.

use serde::{Deserialize, Serialize};

/// Decides visibility when an add and a remove of the same key carry
/// identical timestamps.
///
/// The bias is fixed for the lifetime of a dictionary. Replicas that intend
/// to converge should all use the same bias.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bias {
    /// An add wins against a remove with the same timestamp
    #[default]
    AddWins,
    /// A remove wins against an add with the same timestamp
    RemoveWins,
}

impl Bias {
    /// Returns true if an add stamped `add_ts` survives a remove stamped
    /// `remove_ts` under this bias.
    pub fn keeps<T: Ord>(self, add_ts: &T, remove_ts: &T) -> bool {
        match self {
            Bias::AddWins => add_ts >= remove_ts,
            Bias::RemoveWins => add_ts > remove_ts,
        }
    }
}
