// crates/lineage-journal/src/reader.rs
//
// Sequential journal reader.
//
// Walks the length-delimited frames written by `JournalWriter`. A frame whose
// bytes do not parse as a `JournalEntry` is reported as a corrupt entry and
// the reader moves past it, since its length prefix is intact.
//
// A length prefix that promises more bytes than the file holds is a torn
// tail only when no complete frame can be found anywhere after it; then,
// with `tolerate_torn_tail`, it ends the journal. Any other overrun means
// the damage is mid-file and is reported as a frame error, so later intact
// frames are never mistaken for the remains of a crashed append.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use prost::Message;

use lineage_core::{JournalEntry, LineageError};

use crate::error::JournalError;

/// Longest encoding of a varint length prefix.
const MAX_LENGTH_PREFIX: usize = 10;

/// Reads journal entries back in append order.
#[derive(Debug)]
pub struct JournalReader {
    path: PathBuf,
    data: Vec<u8>,
    offset: usize,
    tolerate_torn_tail: bool,
    stopped_at_torn_tail: bool,
    done: bool,
}

impl JournalReader {
    /// Load the journal file. A missing file reads as an empty journal.
    pub fn open(path: impl Into<PathBuf>, tolerate_torn_tail: bool) -> Result<Self, JournalError> {
        let path = path.into();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no journal file, starting empty");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            data,
            offset: 0,
            tolerate_torn_tail,
            stopped_at_torn_tail: false,
            done: false,
        })
    }

    /// Read the next entry, or `None` at the end of the journal.
    pub fn next_entry(&mut self) -> Result<Option<JournalEntry>, JournalError> {
        if self.done || self.offset >= self.data.len() {
            self.done = true;
            return Ok(None);
        }

        let mut remaining = &self.data[self.offset..];
        let available = remaining.len();

        let len = match prost::decode_length_delimiter(&mut remaining) {
            Ok(len) => len,
            Err(e) if available < MAX_LENGTH_PREFIX => {
                return self.torn_tail(format!("truncated length prefix: {}", e));
            }
            Err(e) => return self.frame_error(format!("invalid length prefix: {}", e)),
        };
        let prefix_len = available - remaining.len();

        let left = remaining.len();
        if len > left {
            return self.torn_tail(format!(
                "frame declares {} bytes but only {} remain",
                len, left
            ));
        }

        let frame = &remaining[..len];
        let frame_offset = self.offset;
        self.offset += prefix_len + len;

        match JournalEntry::decode(frame) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => Err(LineageError::CorruptEntry(format!(
                "undecodable journal entry at byte {}: {}",
                frame_offset, e
            ))
            .into()),
        }
    }

    /// Byte length of the journal up to the end of the last complete frame read.
    pub fn valid_len(&self) -> u64 {
        self.offset as u64
    }

    /// Whether reading stopped at a single incomplete trailing frame.
    ///
    /// Only then are the bytes past `valid_len` safe to discard.
    pub fn ended_at_torn_tail(&self) -> bool {
        self.stopped_at_torn_tail
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn torn_tail(&mut self, reason: String) -> Result<Option<JournalEntry>, JournalError> {
        if self.has_complete_frame_after(self.offset + 1) {
            return self.frame_error(format!("{}, but intact frames follow", reason));
        }
        if !self.tolerate_torn_tail {
            return self.frame_error(reason);
        }
        tracing::warn!(
            path = %self.path.display(),
            offset = self.offset,
            %reason,
            "torn journal tail, treating as end of journal"
        );
        self.stopped_at_torn_tail = true;
        self.done = true;
        Ok(None)
    }

    /// True when a complete, decodable, sequenced frame starts anywhere at
    /// or after byte `from`.
    fn has_complete_frame_after(&self, from: usize) -> bool {
        (from..self.data.len()).any(|start| {
            let mut rest = &self.data[start..];
            match prost::decode_length_delimiter(&mut rest) {
                Ok(len) if len > 0 && len <= rest.len() => JournalEntry::decode(&rest[..len])
                    .map(|entry| entry.sequence_number.is_some() && entry.entry.is_some())
                    .unwrap_or(false),
                _ => false,
            }
        })
    }

    fn frame_error(&mut self, reason: String) -> Result<Option<JournalEntry>, JournalError> {
        self.done = true;
        Err(JournalError::Frame {
            offset: self.offset as u64,
            reason,
        })
    }
}

impl Iterator for JournalReader {
    type Item = Result<JournalEntry, JournalError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}
