// crates/lineage-core/src/lib.rs
//
// lineage-core: Lineage records, job types, and the journal entry codec.
//
// This is the leaf crate that the journal and CLI crates depend on. It
// defines the lineage entity, the job sum type, the protobuf journal
// messages, the lineage id generator, and the error taxonomy.

pub mod error;
pub mod id;
pub mod job;
pub mod journal;
pub mod lineage;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use lineage_core::Lineage;`

// Lineage types
pub use lineage::{Lineage, LineageBuilder};

// Job types
pub use job::{CommandLineJob, FrameworkJob, Job, JobConf};

// Journal messages and codec trait
pub use journal::{
    journal_entry, JournalEntry, JournalEntryRepresentable, LineageEntry,
    LineageIdGeneratorEntry,
};

// Id generation
pub use id::LineageIdGenerator;

// Error type
pub use error::LineageError;
