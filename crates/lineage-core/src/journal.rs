// crates/lineage-core/src/journal.rs
//
// Journal wire messages for the lineage subsystem.
//
// These are protobuf messages with proto2 field presence, declared directly
// with prost derives instead of generated from a .proto file:
//
//   message LineageEntry {
//     optional uint64 id = 1;
//     repeated uint64 input_files = 2;
//     repeated uint64 output_file_ids = 3;
//     optional string job_command = 4;
//     optional string job_output_path = 5;
//     optional uint64 creation_time_ms = 6;
//   }
//
//   message LineageIdGeneratorEntry {
//     optional uint64 sequence_number = 1;
//   }
//
//   message JournalEntry {
//     optional uint64 sequence_number = 1;
//     oneof entry {
//       LineageEntry lineage = 2;
//       LineageIdGeneratorEntry lineage_id_generator = 3;
//     }
//   }
//
// Field tags are part of the on-disk format and must never be renumbered.

use crate::error::LineageError;

/// One lineage record as written to the journal.
#[derive(Clone, PartialEq, prost::Message)]
pub struct LineageEntry {
    #[prost(uint64, optional, tag = "1")]
    pub id: Option<u64>,
    #[prost(uint64, repeated, packed = "false", tag = "2")]
    pub input_files: Vec<u64>,
    /// Always written empty; see `Lineage::to_journal_entry`.
    #[prost(uint64, repeated, packed = "false", tag = "3")]
    pub output_file_ids: Vec<u64>,
    #[prost(string, optional, tag = "4")]
    pub job_command: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub job_output_path: Option<String>,
    #[prost(uint64, optional, tag = "6")]
    pub creation_time_ms: Option<u64>,
}

/// Snapshot of the lineage id generator's sequence.
#[derive(Clone, PartialEq, prost::Message)]
pub struct LineageIdGeneratorEntry {
    #[prost(uint64, optional, tag = "1")]
    pub sequence_number: Option<u64>,
}

/// Tagged envelope appended to the write-ahead log.
#[derive(Clone, PartialEq, prost::Message)]
pub struct JournalEntry {
    /// Assigned by the journal writer at append time.
    #[prost(uint64, optional, tag = "1")]
    pub sequence_number: Option<u64>,
    #[prost(oneof = "journal_entry::Entry", tags = "2, 3")]
    pub entry: Option<journal_entry::Entry>,
}

pub mod journal_entry {
    /// The payload variants of a `JournalEntry`.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Entry {
        #[prost(message, tag = "2")]
        Lineage(super::LineageEntry),
        #[prost(message, tag = "3")]
        LineageIdGenerator(super::LineageIdGeneratorEntry),
    }
}

impl JournalEntry {
    /// Wrap a payload in an envelope with no sequence number yet.
    pub fn wrap(entry: journal_entry::Entry) -> Self {
        Self {
            sequence_number: None,
            entry: Some(entry),
        }
    }

    /// Short tag naming the payload variant, for logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match &self.entry {
            Some(journal_entry::Entry::Lineage(_)) => "lineage",
            Some(journal_entry::Entry::LineageIdGenerator(_)) => "lineage_id_generator",
            None => "empty",
        }
    }
}

/// Anything that can be written to the journal as a single entry.
pub trait JournalEntryRepresentable {
    /// Produce a consistent snapshot of `self` as a journal entry.
    ///
    /// Fails without producing a partial entry when `self` has no durable form.
    fn to_journal_entry(&self) -> Result<JournalEntry, LineageError>;
}
