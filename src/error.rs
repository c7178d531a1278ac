//! Error types for encoding and decoding dictionary snapshots.

use thiserror::Error;

/// Errors produced while decoding a snapshot.
///
/// Field paths use the wire names, e.g. `addSet[2].timestamp`.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed snapshot payload: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("missing required field `{field}`")]
    MissingField { field: String },

    #[error("expected {expected} at `{field}`")]
    UnexpectedShape {
        field: String,
        expected: &'static str,
    },

    #[error("invalid value for field `{field}`: {source}")]
    InvalidField {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// The field path the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            DecodeError::Syntax(_) => None,
            DecodeError::MissingField { field }
            | DecodeError::UnexpectedShape { field, .. }
            | DecodeError::InvalidField { field, .. } => Some(field),
        }
    }
}

/// Errors produced while encoding a snapshot.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}
