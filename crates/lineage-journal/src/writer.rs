// crates/lineage-journal/src/writer.rs
//
// Append-only journal writer.
//
// Each entry is one protobuf `JournalEntry` prefixed with its varint length.
// The writer stamps a monotonically increasing sequence number on every
// entry, flushes after each append, and syncs file data when configured to.
// An append returns only after the frame has reached the file, so callers
// may acknowledge the change as durable once it returns (with sync enabled).
//
// A failed append leaves no partial frame behind: the file is cut back to
// its length before the append. If that rollback also fails, the writer is
// fenced and refuses every later append.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use prost::Message;

use lineage_core::JournalEntryRepresentable;

use crate::error::JournalError;

/// Appends length-delimited journal entries to a single file.
#[derive(Debug)]
pub struct JournalWriter {
    file: File,
    path: PathBuf,
    next_sequence: u64,
    sync_on_append: bool,
    fenced: bool,
}

impl JournalWriter {
    /// Open (or create) the journal file for appending.
    ///
    /// Creates the parent directory if it does not exist.
    pub fn open(
        path: impl Into<PathBuf>,
        next_sequence: u64,
        sync_on_append: bool,
    ) -> Result<Self, JournalError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            file,
            path,
            next_sequence,
            sync_on_append,
            fenced: false,
        })
    }

    /// Open the journal for appending after cutting it back to `valid_len`
    /// bytes, discarding a torn final frame left by a crash.
    pub fn resume(
        path: impl Into<PathBuf>,
        valid_len: u64,
        next_sequence: u64,
        sync_on_append: bool,
    ) -> Result<Self, JournalError> {
        let writer = Self::open(path, next_sequence, sync_on_append)?;
        let current_len = writer.file.metadata()?.len();
        if current_len > valid_len {
            tracing::warn!(
                path = %writer.path.display(),
                current_len,
                valid_len,
                "truncating torn tail before appending"
            );
            writer.file.set_len(valid_len)?;
            writer.file.sync_all()?;
        }
        Ok(writer)
    }

    /// Append one entry and return the sequence number assigned to it.
    ///
    /// Nothing is written when `item` cannot produce a journal entry.
    pub fn append<T>(&mut self, item: &T) -> Result<u64, JournalError>
    where
        T: JournalEntryRepresentable + ?Sized,
    {
        if self.fenced {
            return Err(JournalError::WriterFenced(format!(
                "{} has a partial frame that could not be rolled back",
                self.path.display()
            )));
        }

        let mut entry = item.to_journal_entry()?;
        let sequence = self.next_sequence;
        entry.sequence_number = Some(sequence);

        let frame = entry.encode_length_delimited_to_vec();
        if let Err(e) = append_frame(&mut self.file, &frame, self.sync_on_append) {
            if matches!(e, JournalError::WriterFenced(_)) {
                self.fenced = true;
            }
            return Err(e);
        }

        self.next_sequence += 1;
        tracing::debug!(
            sequence,
            kind = entry.kind(),
            bytes = frame.len(),
            "appended journal entry"
        );
        Ok(sequence)
    }

    /// Sequence number the next append will use.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a failed rollback has disabled this writer.
    pub fn is_fenced(&self) -> bool {
        self.fenced
    }
}

/// Byte sink a journal frame is appended to.
pub(crate) trait FrameSink {
    fn current_len(&mut self) -> io::Result<u64>;
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;
    fn sync(&mut self, sync_data: bool) -> io::Result<()>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl FrameSink for File {
    fn current_len(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.write_all(frame)
    }

    fn sync(&mut self, sync_data: bool) -> io::Result<()> {
        self.flush()?;
        if sync_data {
            self.sync_data()?;
        }
        Ok(())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.sync_data()
    }
}

/// Write one frame, cutting the sink back to its prior length on failure.
pub(crate) fn append_frame<S: FrameSink>(
    sink: &mut S,
    frame: &[u8],
    sync_data: bool,
) -> Result<(), JournalError> {
    let start = sink.current_len()?;
    let written = sink.write_frame(frame).and_then(|()| sink.sync(sync_data));
    let Err(error) = written else {
        return Ok(());
    };

    match sink.truncate(start) {
        Ok(()) => {
            tracing::warn!(%error, len = start, "append failed, rolled back partial frame");
            Err(error.into())
        }
        Err(rollback) => {
            tracing::error!(%error, %rollback, len = start, "append failed and rollback failed");
            Err(JournalError::WriterFenced(format!(
                "append failed ({}) and rollback to {} bytes failed: {}",
                error, start, rollback
            )))
        }
    }
}
