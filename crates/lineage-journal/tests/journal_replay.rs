// crates/lineage-journal/tests/journal_replay.rs
//
// Integration tests for the lineage journal: append, reopen, replay,
// torn-tail recovery, and the corrupt-entry policies.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use prost::Message;
use uuid::Uuid;

use lineage_core::{
    journal_entry, CommandLineJob, FrameworkJob, Job, JobConf, JournalEntry, Lineage,
    LineageEntry, LineageError, LineageIdGenerator,
};
use lineage_journal::{
    replay, CorruptEntryPolicy, JournalConfig, JournalError, JournalWriter, LineageJournal,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a unique temporary journal directory using a UUID suffix.
fn temp_journal_dir(label: &str) -> String {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("lineage_test_{}_{}", label, Uuid::now_v7()));
    path.to_string_lossy().to_string()
}

fn test_config(label: &str) -> JournalConfig {
    JournalConfig {
        journal_dir: temp_journal_dir(label),
        sync_on_append: false,
        ..JournalConfig::default()
    }
}

fn command_job(command: &str, output: &str) -> Job {
    Job::CommandLine(CommandLineJob::new(command, JobConf::new(output)))
}

fn append_raw(path: &PathBuf, bytes: &[u8]) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(bytes).unwrap();
}

fn cleanup(config: &JournalConfig) {
    let _ = fs::remove_dir_all(&config.journal_dir);
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn test_append_then_replay_restores_lineages() {
    let config = test_config("roundtrip");
    let generator = LineageIdGenerator::new();

    {
        let (mut journal, state) = LineageJournal::open(&config).unwrap();
        assert!(state.lineages.is_empty());

        let first = Lineage::with_creation_time(
            generator.generate_id(),
            vec![1, 2, 3],
            vec![10],
            command_job("echo hi", "/out/1"),
            1000,
        );
        let second = Lineage::with_creation_time(
            generator.generate_id(),
            vec![10],
            vec![20, 21],
            command_job("sort /in/10", "/out/2"),
            2000,
        );
        assert_eq!(journal.append_lineage(&first).unwrap(), 0);
        assert_eq!(journal.append_lineage(&second).unwrap(), 1);
        assert_eq!(journal.append_id_generator(&generator).unwrap(), 2);
    }

    let state = replay(&config).unwrap();
    assert_eq!(state.applied, 3);
    assert_eq!(state.skipped, 0);
    assert_eq!(state.last_sequence, Some(2));
    assert_eq!(state.id_generator.sequence_number(), 2);

    let ids: Vec<u64> = state.lineages.keys().copied().collect();
    assert_eq!(ids, vec![0, 1]);

    let first = &state.lineages[&0];
    assert_eq!(&*first.input_files(), &[1, 2, 3]);
    assert!(first.output_files().is_empty(), "outputs are not journaled");
    assert_eq!(first.job().command(), "echo hi");
    assert_eq!(first.job().conf().output_file_path, "/out/1");
    assert_eq!(first.creation_time(), 1000);

    let second = &state.lineages[&1];
    assert_eq!(&*second.input_files(), &[10]);
    assert_eq!(second.creation_time(), 2000);

    cleanup(&config);
}

#[test]
fn test_sequence_numbers_resume_after_reopen() {
    let config = test_config("resume");

    {
        let (mut journal, _) = LineageJournal::open(&config).unwrap();
        let lineage = Lineage::new(1, vec![], vec![], command_job("true", "/dev/null"));
        journal.append_lineage(&lineage).unwrap();
        journal.append_lineage(&lineage).unwrap();
    }

    let (mut journal, state) = LineageJournal::open(&config).unwrap();
    assert_eq!(state.last_sequence, Some(1));
    assert_eq!(journal.writer().next_sequence(), 2);

    let lineage = Lineage::new(2, vec![1], vec![], command_job("false", "/dev/null"));
    assert_eq!(journal.append_lineage(&lineage).unwrap(), 2);

    cleanup(&config);
}

#[test]
fn test_missing_journal_replays_empty() {
    let config = test_config("missing");
    let state = replay(&config).unwrap();
    assert!(state.lineages.is_empty());
    assert_eq!(state.last_sequence, None);
    assert_eq!(state.valid_len, 0);
}

#[test]
fn test_non_durable_job_writes_nothing() {
    let config = test_config("framework");
    let mut writer = JournalWriter::open(config.journal_path(), 0, false).unwrap();

    let lineage = Lineage::new(
        5,
        vec![1],
        vec![2],
        Job::Framework(FrameworkJob {
            name: "wordcount".to_string(),
            conf: JobConf::new("/out/wc"),
        }),
    );
    let err = writer.append(&lineage).unwrap_err();
    assert!(matches!(err, JournalError::Lineage(LineageError::IllegalState(_))));
    assert_eq!(writer.next_sequence(), 0);
    assert_eq!(fs::metadata(config.journal_path()).unwrap().len(), 0);

    cleanup(&config);
}

// ---------------------------------------------------------------------------
// Torn tail
// ---------------------------------------------------------------------------

#[test]
fn test_torn_tail_is_tolerated_and_truncated() {
    let config = test_config("torn");
    {
        let (mut journal, _) = LineageJournal::open(&config).unwrap();
        journal
            .append_lineage(&Lineage::new(1, vec![1], vec![], command_job("a", "/o/a")))
            .unwrap();
    }
    let intact_len = fs::metadata(config.journal_path()).unwrap().len();

    // Length prefix of 32 followed by only three bytes.
    append_raw(&config.journal_path(), &[0x20, 0x08, 0x01, 0x12]);

    let state = replay(&config).unwrap();
    assert_eq!(state.lineages.len(), 1);
    assert_eq!(state.valid_len, intact_len);
    assert!(state.torn_tail);

    {
        let (mut journal, _) = LineageJournal::open(&config).unwrap();
        assert_eq!(fs::metadata(config.journal_path()).unwrap().len(), intact_len);
        journal
            .append_lineage(&Lineage::new(2, vec![2], vec![], command_job("b", "/o/b")))
            .unwrap();
    }

    let state = replay(&config).unwrap();
    assert_eq!(state.lineages.len(), 2);
    assert_eq!(state.last_sequence, Some(1));

    cleanup(&config);
}

#[test]
fn test_torn_tail_rejected_when_not_tolerated() {
    let mut config = test_config("torn_strict");
    config.tolerate_torn_tail = false;
    fs::create_dir_all(&config.journal_dir).unwrap();
    append_raw(&config.journal_path(), &[0x20, 0x08]);

    let err = replay(&config).unwrap_err();
    assert!(matches!(err, JournalError::Frame { offset: 0, .. }));

    cleanup(&config);
}

#[test]
fn test_damaged_middle_frame_is_not_truncated() {
    let config = test_config("mid_damage");
    let mut frame_ends = Vec::new();
    {
        let (mut journal, _) = LineageJournal::open(&config).unwrap();
        for id in 1..=3 {
            journal
                .append_lineage(&Lineage::new(id, vec![id], vec![], command_job("a", "/o/a")))
                .unwrap();
            frame_ends.push(fs::metadata(config.journal_path()).unwrap().len());
        }
    }

    // Overwrite the length prefix of frame 2 so it overruns the file.
    let mut bytes = fs::read(config.journal_path()).unwrap();
    bytes[frame_ends[0] as usize] = 0x7f;
    fs::write(config.journal_path(), &bytes).unwrap();
    let len_before = bytes.len() as u64;

    let err = LineageJournal::open(&config).unwrap_err();
    assert!(
        matches!(err, JournalError::Frame { offset, .. } if offset == frame_ends[0]),
        "{:?}",
        err
    );
    assert_eq!(fs::metadata(config.journal_path()).unwrap().len(), len_before);

    cleanup(&config);
}

#[test]
fn test_intact_journal_is_never_truncated_on_open() {
    let config = test_config("no_truncate");
    {
        let (mut journal, _) = LineageJournal::open(&config).unwrap();
        journal
            .append_lineage(&Lineage::new(1, vec![1], vec![], command_job("a", "/o/a")))
            .unwrap();
    }
    let len = fs::metadata(config.journal_path()).unwrap().len();

    let (_, state) = LineageJournal::open(&config).unwrap();
    assert!(!state.torn_tail);
    assert_eq!(fs::metadata(config.journal_path()).unwrap().len(), len);

    cleanup(&config);
}

// ---------------------------------------------------------------------------
// Id allocation across restarts
// ---------------------------------------------------------------------------

/// Allocate an id, journal the advanced generator, then the lineage.
fn submit(journal: &mut LineageJournal, generator: &LineageIdGenerator, command: &str) -> u64 {
    let id = generator.generate_id();
    let lineage = Lineage::builder(id)
        .input_files(vec![1])
        .output_files(vec![2])
        .job(CommandLineJob::new(command, JobConf::new("/out")))
        .build()
        .unwrap();
    journal.append_id_generator(generator).unwrap();
    journal.append_lineage(&lineage).unwrap();
    id
}

#[test]
fn test_submitted_ids_continue_after_reopen() {
    let config = test_config("submit");
    {
        let (mut journal, state) = LineageJournal::open(&config).unwrap();
        assert_eq!(submit(&mut journal, &state.id_generator, "first"), 0);
        assert_eq!(submit(&mut journal, &state.id_generator, "second"), 1);
    }

    let (mut journal, state) = LineageJournal::open(&config).unwrap();
    assert_eq!(state.lineages.len(), 2);
    assert_eq!(state.lineages[&1].job().command(), "second");
    assert_eq!(state.last_sequence, Some(3));
    assert_eq!(submit(&mut journal, &state.id_generator, "third"), 2);

    cleanup(&config);
}

#[test]
fn test_generator_snapshot_without_lineage_never_reuses_id() {
    let config = test_config("submit_crash");
    {
        let (mut journal, state) = LineageJournal::open(&config).unwrap();
        // The lineage append never happens for this id.
        state.id_generator.generate_id();
        journal.append_id_generator(&state.id_generator).unwrap();
    }

    let (_, state) = LineageJournal::open(&config).unwrap();
    assert!(state.lineages.is_empty());
    assert_eq!(state.id_generator.generate_id(), 1);

    cleanup(&config);
}

// ---------------------------------------------------------------------------
// Corrupt entries
// ---------------------------------------------------------------------------

/// Write one good lineage, one lineage entry without a job command, and
/// another good lineage.
fn write_journal_with_corrupt_entry(config: &JournalConfig) {
    let mut writer = JournalWriter::open(config.journal_path(), 0, false).unwrap();
    writer
        .append(&Lineage::new(1, vec![1], vec![], command_job("a", "/o/a")))
        .unwrap();

    let corrupt = JournalEntry {
        sequence_number: Some(1),
        entry: Some(journal_entry::Entry::Lineage(LineageEntry {
            id: Some(2),
            input_files: vec![1],
            output_file_ids: vec![],
            job_command: None,
            job_output_path: Some("/o/b".to_string()),
            creation_time_ms: Some(5),
        })),
    };
    append_raw(&config.journal_path(), &corrupt.encode_length_delimited_to_vec());

    let mut writer = JournalWriter::open(config.journal_path(), 2, false).unwrap();
    writer
        .append(&Lineage::new(3, vec![2], vec![], command_job("c", "/o/c")))
        .unwrap();
}

#[test]
fn test_corrupt_entry_aborts_by_default() {
    let config = test_config("corrupt_abort");
    write_journal_with_corrupt_entry(&config);

    let err = replay(&config).unwrap_err();
    match err {
        JournalError::Lineage(LineageError::CorruptEntry(msg)) => {
            assert!(msg.contains("job_command"), "{}", msg)
        }
        other => panic!("expected CorruptEntry, got {:?}", other),
    }

    cleanup(&config);
}

#[test]
fn test_corrupt_entry_skipped_by_policy() {
    let mut config = test_config("corrupt_skip");
    config.on_corrupt_entry = CorruptEntryPolicy::Skip;
    write_journal_with_corrupt_entry(&config);

    let state = replay(&config).unwrap();
    assert_eq!(state.skipped, 1);
    assert_eq!(state.applied, 2);
    let ids: Vec<u64> = state.lineages.keys().copied().collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(state.last_sequence, Some(2));

    cleanup(&config);
}

#[test]
fn test_undecodable_frame_skipped_by_policy() {
    let mut config = test_config("garbage_frame");
    config.on_corrupt_entry = CorruptEntryPolicy::Skip;

    let mut writer = JournalWriter::open(config.journal_path(), 0, false).unwrap();
    writer
        .append(&Lineage::new(1, vec![1], vec![], command_job("a", "/o/a")))
        .unwrap();
    // Well-framed three bytes that are not a valid message.
    append_raw(&config.journal_path(), &[0x03, 0xff, 0xff, 0xff]);
    let mut writer = JournalWriter::open(config.journal_path(), 1, false).unwrap();
    writer
        .append(&Lineage::new(2, vec![1], vec![], command_job("b", "/o/b")))
        .unwrap();

    let state = replay(&config).unwrap();
    assert_eq!(state.skipped, 1);
    assert_eq!(state.lineages.len(), 2);

    cleanup(&config);
}
