// crates/lineage-core/src/lineage.rs
//
// The lineage record: which job produces which output files from which
// input files.
//
// A lineage is immutable after construction. The two file lists are still
// read under a per-record lock so that concurrent readers and the journal
// checkpoint thread always see a fully formed copy.
//
// Journal encoding reduces the job to its command-line form. Output file ids
// are not carried by the journal: encode writes an empty `output_file_ids`
// and decode always restores an empty output list. Existing journals depend
// on this layout, so it must not change without a versioned migration.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::error::LineageError;
use crate::job::{CommandLineJob, Job, JobConf};
use crate::journal::{journal_entry, JournalEntry, JournalEntryRepresentable, LineageEntry};

/// Dependencies imposed by a job: the input files it reads and the output
/// files it generates.
#[derive(Debug)]
pub struct Lineage {
    id: u64,
    files: Mutex<LineageFiles>,
    job: Job,
    creation_time_ms: u64,
}

#[derive(Debug)]
struct LineageFiles {
    input: Arc<[u64]>,
    output: Arc<[u64]>,
}

impl Lineage {
    /// Create a lineage stamped with the current wall-clock time.
    ///
    /// The file lists are taken by value; the record owns its copies.
    pub fn new(id: u64, input_files: Vec<u64>, output_files: Vec<u64>, job: Job) -> Self {
        Self::with_creation_time(id, input_files, output_files, job, now_ms())
    }

    /// Create a lineage with an explicit creation time (epoch milliseconds).
    pub fn with_creation_time(
        id: u64,
        input_files: Vec<u64>,
        output_files: Vec<u64>,
        job: Job,
        creation_time_ms: u64,
    ) -> Self {
        Self {
            id,
            files: Mutex::new(LineageFiles {
                input: input_files.into(),
                output: output_files.into(),
            }),
            job,
            creation_time_ms,
        }
    }

    /// Start a builder for callers whose inputs may be missing.
    pub fn builder(id: u64) -> LineageBuilder {
        LineageBuilder::new(id)
    }

    /// Read-only view of the input file ids, in insertion order.
    pub fn input_files(&self) -> Arc<[u64]> {
        Arc::clone(&self.lock_files().input)
    }

    /// Read-only view of the output file ids, in insertion order.
    pub fn output_files(&self) -> Arc<[u64]> {
        Arc::clone(&self.lock_files().output)
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Creation time in epoch milliseconds.
    pub fn creation_time(&self) -> u64 {
        self.creation_time_ms
    }

    /// Creation time as a UTC timestamp, if it is representable.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.creation_time_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    /// Rebuild a lineage from its journal entry.
    ///
    /// The output file list is always empty: the journal does not carry it.
    pub fn from_journal_entry(entry: &LineageEntry) -> Result<Self, LineageError> {
        let id = required(entry.id, "id")?;
        let command = required(entry.job_command.clone(), "job_command")?;
        let output_path = required(entry.job_output_path.clone(), "job_output_path")?;
        let creation_time_ms = required(entry.creation_time_ms, "creation_time_ms")?;

        if !entry.output_file_ids.is_empty() {
            tracing::debug!(
                lineage_id = id,
                count = entry.output_file_ids.len(),
                "ignoring output_file_ids present in lineage entry"
            );
        }

        let job = Job::CommandLine(CommandLineJob::new(command, JobConf::new(output_path)));
        Ok(Self::with_creation_time(
            id,
            entry.input_files.clone(),
            Vec::new(),
            job,
            creation_time_ms,
        ))
    }

    /// Rebuild a lineage from a journal envelope, which must hold a lineage entry.
    pub fn from_envelope(entry: &JournalEntry) -> Result<Self, LineageError> {
        match &entry.entry {
            Some(journal_entry::Entry::Lineage(lineage)) => Self::from_journal_entry(lineage),
            _ => Err(LineageError::CorruptEntry(format!(
                "expected a lineage entry, found {}",
                entry.kind()
            ))),
        }
    }

    /// The list data never changes after construction, so a poisoned lock
    /// still guards a consistent value.
    fn lock_files(&self) -> MutexGuard<'_, LineageFiles> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl JournalEntryRepresentable for Lineage {
    /// Encode this lineage as a `lineage` journal entry.
    ///
    /// Only command-line jobs have a journal form; any other job kind fails
    /// with `IllegalState`. `output_file_ids` is always written empty.
    fn to_journal_entry(&self) -> Result<JournalEntry, LineageError> {
        let files = self.lock_files();
        let input_files = files.input.to_vec();

        let job = match &self.job {
            Job::CommandLine(job) => job,
            other => {
                tracing::warn!(
                    lineage_id = self.id,
                    job_kind = other.kind(),
                    "refusing to journal lineage with non-durable job"
                );
                return Err(LineageError::IllegalState(format!(
                    "lineage {} holds a {} job; only command-line jobs can be journaled",
                    self.id,
                    other.kind()
                )));
            }
        };

        let entry = LineageEntry {
            id: Some(self.id),
            input_files,
            output_file_ids: Vec::new(),
            job_command: Some(job.command.clone()),
            job_output_path: Some(job.conf.output_file_path.clone()),
            creation_time_ms: Some(self.creation_time_ms),
        };
        Ok(JournalEntry::wrap(journal_entry::Entry::Lineage(entry)))
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let files = self.lock_files();
        write!(
            f,
            "Lineage{{id={}, input_files={:?}, output_files={:?}, job={}({:?}), creation_time_ms={}}}",
            self.id,
            &*files.input,
            &*files.output,
            self.job.kind(),
            self.job.command(),
            self.creation_time_ms
        )
    }
}

/// Fallible construction path: each of input files, output files and job
/// must be supplied before `build`.
#[derive(Debug, Default)]
pub struct LineageBuilder {
    id: u64,
    input_files: Option<Vec<u64>>,
    output_files: Option<Vec<u64>>,
    job: Option<Job>,
    creation_time_ms: Option<u64>,
}

impl LineageBuilder {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn input_files(mut self, input_files: Vec<u64>) -> Self {
        self.input_files = Some(input_files);
        self
    }

    pub fn output_files(mut self, output_files: Vec<u64>) -> Self {
        self.output_files = Some(output_files);
        self
    }

    pub fn job(mut self, job: impl Into<Job>) -> Self {
        self.job = Some(job.into());
        self
    }

    /// Override the creation time; defaults to now at `build`.
    pub fn creation_time_ms(mut self, creation_time_ms: u64) -> Self {
        self.creation_time_ms = Some(creation_time_ms);
        self
    }

    pub fn build(self) -> Result<Lineage, LineageError> {
        let input_files = self
            .input_files
            .ok_or_else(|| LineageError::InvalidArgument("input files must be provided".into()))?;
        let output_files = self
            .output_files
            .ok_or_else(|| LineageError::InvalidArgument("output files must be provided".into()))?;
        let job = self
            .job
            .ok_or_else(|| LineageError::InvalidArgument("job must be provided".into()))?;
        let creation_time_ms = self.creation_time_ms.unwrap_or_else(now_ms);

        Ok(Lineage::with_creation_time(
            self.id,
            input_files,
            output_files,
            job,
            creation_time_ms,
        ))
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, LineageError> {
    value.ok_or_else(|| LineageError::CorruptEntry(format!("lineage entry missing {}", field)))
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
