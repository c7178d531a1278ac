//! Construction options for a dictionary replica.

use serde::{Deserialize, Serialize};

use crate::crdt::types::bias::Bias;
use crate::crdt::types::replica::ReplicaId;

/// Options used when constructing a dictionary.
///
/// Both fields are optional in serialized form: the bias defaults to
/// `AddWins` and a missing replica id means a fresh random one is generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DictConfig {
    pub bias: Bias,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_id: Option<ReplicaId>,
}

impl DictConfig {
    pub fn with_bias(mut self, bias: Bias) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_replica_id(mut self, replica_id: impl Into<ReplicaId>) -> Self {
        self.replica_id = Some(replica_id.into());
        self
    }
}
