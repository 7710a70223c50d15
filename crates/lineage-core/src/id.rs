// crates/lineage-core/src/id.rs

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::LineageError;
use crate::journal::{journal_entry, JournalEntry, JournalEntryRepresentable, LineageIdGeneratorEntry};

/// Hands out lineage ids from a monotonically increasing sequence.
///
/// The current sequence is journaled so ids are never reused after a restart.
#[derive(Debug, Default)]
pub struct LineageIdGenerator {
    sequence_number: AtomicU64,
}

impl LineageIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next id and advance the sequence.
    pub fn generate_id(&self) -> u64 {
        self.sequence_number.fetch_add(1, Ordering::SeqCst)
    }

    /// The id the next call to `generate_id` will return.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number.load(Ordering::SeqCst)
    }

    /// Restore the sequence from a journaled snapshot.
    pub fn init_from_journal_entry(
        &self,
        entry: &LineageIdGeneratorEntry,
    ) -> Result<(), LineageError> {
        let sequence = entry.sequence_number.ok_or_else(|| {
            LineageError::CorruptEntry("lineage id generator entry missing sequence_number".into())
        })?;
        self.sequence_number.store(sequence, Ordering::SeqCst);
        Ok(())
    }
}

impl JournalEntryRepresentable for LineageIdGenerator {
    fn to_journal_entry(&self) -> Result<JournalEntry, LineageError> {
        Ok(JournalEntry::wrap(journal_entry::Entry::LineageIdGenerator(
            LineageIdGeneratorEntry {
                sequence_number: Some(self.sequence_number()),
            },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let generator = LineageIdGenerator::new();
        assert_eq!(generator.generate_id(), 0);
        assert_eq!(generator.generate_id(), 1);
        assert_eq!(generator.generate_id(), 2);
        assert_eq!(generator.sequence_number(), 3);
    }

    #[test]
    fn test_restore_from_journal_entry() {
        let generator = LineageIdGenerator::new();
        for _ in 0..5 {
            generator.generate_id();
        }
        let entry = generator.to_journal_entry().unwrap();

        let restored = LineageIdGenerator::new();
        match entry.entry {
            Some(journal_entry::Entry::LineageIdGenerator(ref e)) => {
                restored.init_from_journal_entry(e).unwrap()
            }
            _ => panic!("expected a lineage id generator entry"),
        }
        assert_eq!(restored.generate_id(), 5);
    }

    #[test]
    fn test_restore_rejects_missing_sequence() {
        let generator = LineageIdGenerator::new();
        let err = generator
            .init_from_journal_entry(&LineageIdGeneratorEntry::default())
            .unwrap_err();
        assert!(matches!(err, LineageError::CorruptEntry(_)));
    }
}
