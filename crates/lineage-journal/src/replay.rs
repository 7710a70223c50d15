// crates/lineage-journal/src/replay.rs
//
// Restart replay: rebuild lineage records and the id generator from the
// journal, one entry at a time, in append order.

use std::collections::BTreeMap;
use std::path::Path;

use lineage_core::{journal_entry, JournalEntry, Lineage, LineageError, LineageIdGenerator};

use crate::config::{CorruptEntryPolicy, JournalConfig};
use crate::error::JournalError;
use crate::reader::JournalReader;

/// In-memory state rebuilt from a journal.
#[derive(Debug, Default)]
pub struct ReplayedState {
    /// Lineages by id. A later entry for the same id replaces an earlier one.
    pub lineages: BTreeMap<u64, Lineage>,
    /// Id generator restored from its latest snapshot.
    pub id_generator: LineageIdGenerator,
    /// Highest sequence number seen.
    pub last_sequence: Option<u64>,
    /// Entries applied.
    pub applied: usize,
    /// Corrupt entries skipped under `CorruptEntryPolicy::Skip`.
    pub skipped: usize,
    /// Journal length up to the end of the last complete frame.
    pub valid_len: u64,
    /// Replay stopped at a single incomplete trailing frame past `valid_len`.
    pub torn_tail: bool,
}

/// Replay the journal named by `config`.
pub fn replay(config: &JournalConfig) -> Result<ReplayedState, JournalError> {
    replay_path(
        &config.journal_path(),
        config.on_corrupt_entry,
        config.tolerate_torn_tail,
    )
}

/// Replay the journal at `path` with an explicit corrupt-entry policy.
pub fn replay_path(
    path: &Path,
    policy: CorruptEntryPolicy,
    tolerate_torn_tail: bool,
) -> Result<ReplayedState, JournalError> {
    let mut reader = JournalReader::open(path, tolerate_torn_tail)?;
    let mut state = ReplayedState::default();

    loop {
        match reader.next_entry() {
            Ok(Some(entry)) => {
                note_sequence(&mut state, &entry);
                if let Err(e) = apply(&mut state, &entry) {
                    handle_corrupt(&mut state, policy, entry.sequence_number, e)?;
                }
            }
            Ok(None) => break,
            Err(JournalError::Lineage(e)) => handle_corrupt(&mut state, policy, None, e)?,
            Err(e) => return Err(e),
        }
    }

    state.valid_len = reader.valid_len();
    state.torn_tail = reader.ended_at_torn_tail();
    tracing::info!(
        path = %path.display(),
        applied = state.applied,
        skipped = state.skipped,
        lineages = state.lineages.len(),
        next_lineage_id = state.id_generator.sequence_number(),
        "journal replay complete"
    );
    Ok(state)
}

fn apply(state: &mut ReplayedState, entry: &JournalEntry) -> Result<(), LineageError> {
    match &entry.entry {
        Some(journal_entry::Entry::Lineage(lineage_entry)) => {
            let lineage = Lineage::from_journal_entry(lineage_entry)?;
            let id = lineage.id();
            if state.lineages.insert(id, lineage).is_some() {
                tracing::warn!(lineage_id = id, "duplicate lineage id in journal, keeping latest");
            }
        }
        Some(journal_entry::Entry::LineageIdGenerator(generator_entry)) => {
            state.id_generator.init_from_journal_entry(generator_entry)?;
        }
        None => {
            return Err(LineageError::CorruptEntry(
                "journal entry has no payload".to_string(),
            ))
        }
    }
    state.applied += 1;
    Ok(())
}

fn note_sequence(state: &mut ReplayedState, entry: &JournalEntry) {
    let Some(sequence) = entry.sequence_number else {
        return;
    };
    match state.last_sequence {
        Some(last) if sequence <= last => {
            tracing::warn!(sequence, last, "journal sequence number did not increase");
        }
        _ => state.last_sequence = Some(sequence),
    }
}

fn handle_corrupt(
    state: &mut ReplayedState,
    policy: CorruptEntryPolicy,
    sequence: Option<u64>,
    error: LineageError,
) -> Result<(), JournalError> {
    match policy {
        CorruptEntryPolicy::Abort => {
            tracing::error!(?sequence, %error, "corrupt journal entry, aborting replay");
            Err(error.into())
        }
        CorruptEntryPolicy::Skip => {
            tracing::warn!(?sequence, %error, "skipping corrupt journal entry");
            state.skipped += 1;
            Ok(())
        }
    }
}
