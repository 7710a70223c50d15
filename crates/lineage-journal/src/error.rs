use thiserror::Error;

use lineage_core::LineageError;

/// Errors raised by the journal writer, reader, and replay.
#[derive(Debug, Error)]
pub enum JournalError {
    /// Filesystem error opening, reading, writing, or syncing the journal.
    #[error("Journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Damaged framing that cannot be treated as a torn tail.
    #[error("Journal frame error at byte {offset}: {reason}")]
    Frame { offset: u64, reason: String },

    /// A lineage entry failed to encode or decode.
    #[error(transparent)]
    Lineage(#[from] LineageError),

    /// A failed append could not be rolled back; the writer accepts no more appends.
    #[error("Journal writer fenced: {0}")]
    WriterFenced(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Journal config error: {0}")]
    Config(String),
}
