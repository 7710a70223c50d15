use thiserror::Error;

/// Errors raised while constructing, encoding, or decoding lineage records.
#[derive(Debug, Error)]
pub enum LineageError {
    /// A required constructor input was not supplied.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The record is in a state that cannot be journaled (e.g. a non-durable job kind).
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// A journal entry is malformed or missing required fields.
    #[error("Corrupt journal entry: {0}")]
    CorruptEntry(String),
}

impl From<prost::DecodeError> for LineageError {
    fn from(e: prost::DecodeError) -> Self {
        LineageError::CorruptEntry(e.to_string())
    }
}
