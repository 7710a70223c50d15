// crates/lineage-journal/src/lib.rs
//
// lineage-journal: Write-ahead journal for lineage records.
//
// Appends length-delimited `JournalEntry` frames to a single journal file,
// reads them back, and replays them into lineage records on restart. Corrupt
// lineage entries abort replay or are skipped according to configuration.

pub mod config;
pub mod error;
pub mod reader;
pub mod replay;
pub mod writer;

use lineage_core::{Lineage, LineageIdGenerator};

// Re-export key types for ergonomic access from downstream crates.
pub use config::{CorruptEntryPolicy, JournalConfig};
pub use error::JournalError;
pub use reader::JournalReader;
pub use replay::{replay, replay_path, ReplayedState};
pub use writer::JournalWriter;

/// A replayed journal opened for further appends.
#[derive(Debug)]
pub struct LineageJournal {
    writer: JournalWriter,
}

impl LineageJournal {
    /// Replay the configured journal, then open it for appending after the
    /// last replayed sequence number. A torn trailing frame is cut off
    /// first; nothing else is ever truncated.
    pub fn open(config: &JournalConfig) -> Result<(Self, ReplayedState), JournalError> {
        let state = replay(config)?;
        let next_sequence = state.last_sequence.map_or(0, |seq| seq + 1);
        let writer = if state.torn_tail {
            JournalWriter::resume(
                config.journal_path(),
                state.valid_len,
                next_sequence,
                config.sync_on_append,
            )?
        } else {
            JournalWriter::open(config.journal_path(), next_sequence, config.sync_on_append)?
        };
        tracing::info!(
            path = %writer.path().display(),
            lineages = state.lineages.len(),
            next_sequence,
            "lineage journal opened"
        );
        Ok((Self { writer }, state))
    }

    /// Append a lineage entry, returning its sequence number.
    pub fn append_lineage(&mut self, lineage: &Lineage) -> Result<u64, JournalError> {
        self.writer.append(lineage)
    }

    /// Append a snapshot of the id generator, returning its sequence number.
    pub fn append_id_generator(&mut self, generator: &LineageIdGenerator) -> Result<u64, JournalError> {
        self.writer.append(generator)
    }

    pub fn writer(&self) -> &JournalWriter {
        &self.writer
    }
}
