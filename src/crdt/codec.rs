//! Snapshot encoding for the LWW dictionary.
//!
//! A snapshot carries the raw add and remove histories, never the visible
//! view, so a reloaded replica can still merge with its peers. The wire form
//! is JSON:
//!
//! ```json
//! {
//!   "addSet": [{"key": "k", "value": "v", "timestamp": 3, "sourceReplicaId": "A"}],
//!   "removeSet": [{"key": "k", "timestamp": 2}],
//!   "bias": "addWins",
//!   "replicaId": "A"
//! }
//! ```
//!
//! Decoding rebuilds the one-record-per-key maps. Duplicate keys in a payload
//! fold with the same rules merge uses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::crdt::dict::LwwDict;
use crate::crdt::merge::{fold_add, fold_remove};
use crate::crdt::types::{AddRecord, Bias, ReplicaId};
use crate::error::{CodecError, DecodeError};

/// One entry of the encoded add history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntry<K, V, T> {
    pub key: K,
    pub value: V,
    pub timestamp: T,
    /// Absent in older payloads; defaults to the snapshot's replica id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_replica_id: Option<ReplicaId>,
}

/// One entry of the encoded remove history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveEntry<K, T> {
    pub key: K,
    pub timestamp: T,
}

/// The serialized form of a dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<K, V, T> {
    pub add_set: Vec<AddEntry<K, V, T>>,
    pub remove_set: Vec<RemoveEntry<K, T>>,
    pub bias: Bias,
    #[serde(default)]
    pub replica_id: Option<ReplicaId>,
}

impl<K, V, T> From<&LwwDict<K, V, T>> for Snapshot<K, V, T>
where
    K: Clone,
    V: Clone,
    T: Clone,
{
    fn from(dict: &LwwDict<K, V, T>) -> Self {
        let add_set = dict
            .add_history
            .iter()
            .map(|(key, record)| AddEntry {
                key: key.clone(),
                value: record.value.clone(),
                timestamp: record.timestamp.clone(),
                source_replica_id: Some(record.source_replica_id.clone()),
            })
            .collect();

        let remove_set = dict
            .remove_history
            .iter()
            .map(|(key, timestamp)| RemoveEntry {
                key: key.clone(),
                timestamp: timestamp.clone(),
            })
            .collect();

        Snapshot {
            add_set,
            remove_set,
            bias: dict.bias,
            replica_id: Some(dict.replica_id.clone()),
        }
    }
}

impl<K, V, T> Snapshot<K, V, T>
where
    K: Ord,
    V: Serialize,
    T: Ord,
{
    /// Rebuilds a dictionary from the snapshot, folding duplicate entries.
    pub fn into_dict(self) -> LwwDict<K, V, T> {
        let replica_id = self.replica_id.unwrap_or_else(|| {
            let fresh = ReplicaId::random();
            debug!(replica = %fresh, "snapshot has no replica id; generated one");
            fresh
        });

        let mut duplicates = 0usize;

        let mut add_history = BTreeMap::new();
        for entry in self.add_set {
            let source = entry
                .source_replica_id
                .unwrap_or_else(|| replica_id.clone());
            let record = AddRecord::new(entry.value, entry.timestamp, source);
            if fold_add(&mut add_history, entry.key, record) {
                duplicates += 1;
            }
        }

        let mut remove_history = BTreeMap::new();
        for entry in self.remove_set {
            if fold_remove(&mut remove_history, entry.key, entry.timestamp) {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            warn!(
                replica = %replica_id,
                duplicates,
                "snapshot contained duplicate keys; resolved with merge rules"
            );
        }

        LwwDict {
            add_history,
            remove_history,
            bias: self.bias,
            replica_id,
        }
    }
}

impl<K, V, T> Snapshot<K, V, T>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
    T: DeserializeOwned,
{
    /// Reads a snapshot from a JSON document, one field at a time, so that
    /// errors name the exact field that failed.
    ///
    /// Fields stay as raw JSON text until their own type reads them, so
    /// numbers wider than 64 bits keep their precision.
    pub fn from_json(root: &RawValue) -> Result<Self, DecodeError> {
        let mut fields = into_object(root, "$")?;

        let add_set = take_list(&mut fields, "addSet")?
            .iter()
            .enumerate()
            .map(|(i, item)| add_entry(item, format!("addSet[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        let remove_set = take_list(&mut fields, "removeSet")?
            .iter()
            .enumerate()
            .map(|(i, item)| remove_entry(item, format!("removeSet[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;

        let bias = take_field(&mut fields, "", "bias")?;
        let replica_id = take_optional(&mut fields, "", "replicaId")?;

        Ok(Snapshot {
            add_set,
            remove_set,
            bias,
            replica_id,
        })
    }
}

type Fields = BTreeMap<String, Box<RawValue>>;

fn add_entry<K, V, T>(item: &RawValue, path: String) -> Result<AddEntry<K, V, T>, DecodeError>
where
    K: DeserializeOwned,
    V: DeserializeOwned,
    T: DeserializeOwned,
{
    let mut fields = into_object(item, &path)?;
    Ok(AddEntry {
        key: take_field(&mut fields, &path, "key")?,
        value: take_field(&mut fields, &path, "value")?,
        timestamp: take_field(&mut fields, &path, "timestamp")?,
        source_replica_id: take_optional(&mut fields, &path, "sourceReplicaId")?,
    })
}

fn remove_entry<K, T>(item: &RawValue, path: String) -> Result<RemoveEntry<K, T>, DecodeError>
where
    K: DeserializeOwned,
    T: DeserializeOwned,
{
    let mut fields = into_object(item, &path)?;
    Ok(RemoveEntry {
        key: take_field(&mut fields, &path, "key")?,
        timestamp: take_field(&mut fields, &path, "timestamp")?,
    })
}

fn field_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn into_object(raw: &RawValue, field: &str) -> Result<Fields, DecodeError> {
    serde_json::from_str(raw.get()).map_err(|_| DecodeError::UnexpectedShape {
        field: field.to_string(),
        expected: "an object",
    })
}

fn take_list(fields: &mut Fields, name: &str) -> Result<Vec<Box<RawValue>>, DecodeError> {
    let raw = fields
        .remove(name)
        .ok_or_else(|| DecodeError::MissingField {
            field: name.to_string(),
        })?;
    serde_json::from_str(raw.get()).map_err(|_| DecodeError::UnexpectedShape {
        field: name.to_string(),
        expected: "a list",
    })
}

fn take_field<D: DeserializeOwned>(
    fields: &mut Fields,
    parent: &str,
    name: &str,
) -> Result<D, DecodeError> {
    let field = field_path(parent, name);
    let raw = fields
        .remove(name)
        .ok_or_else(|| DecodeError::MissingField {
            field: field.clone(),
        })?;
    serde_json::from_str(raw.get()).map_err(|source| DecodeError::InvalidField { field, source })
}

fn take_optional<D: DeserializeOwned>(
    fields: &mut Fields,
    parent: &str,
    name: &str,
) -> Result<Option<D>, DecodeError> {
    match fields.remove(name) {
        None => Ok(None),
        // `null` reads as `None`
        Some(raw) => serde_json::from_str::<Option<D>>(raw.get()).map_err(|source| {
            DecodeError::InvalidField {
                field: field_path(parent, name),
                source,
            }
        }),
    }
}

impl<K, V, T> LwwDict<K, V, T>
where
    K: Serialize + Clone,
    V: Serialize + Clone,
    T: Serialize + Clone,
{
    /// Encodes the full raw state as compact JSON.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Encodes the full raw state as indented JSON text.
    pub fn encode_pretty(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<K, V, T> LwwDict<K, V, T>
where
    K: DeserializeOwned + Ord,
    V: DeserializeOwned + Serialize,
    T: DeserializeOwned + Ord,
{
    /// Decodes a state produced by [`LwwDict::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let root: Box<RawValue> = serde_json::from_slice(bytes).map_err(DecodeError::Syntax)?;
        Snapshot::from_json(&root).map(Snapshot::into_dict)
    }
}

impl<K, V, T> Serialize for LwwDict<K, V, T>
where
    K: Serialize + Clone,
    V: Serialize + Clone,
    T: Serialize + Clone,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Snapshot::from(self).serialize(serializer)
    }
}

impl<'de, K, V, T> Deserialize<'de> for LwwDict<K, V, T>
where
    K: Deserialize<'de> + Ord,
    V: Deserialize<'de> + Serialize,
    T: Deserialize<'de> + Ord,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Snapshot::deserialize(deserializer).map(Snapshot::into_dict)
    }
}
