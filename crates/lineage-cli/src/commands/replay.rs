// crates/lineage-cli/src/commands/replay.rs
//
// `lineage replay` — replay the journal and summarize the recovered state.

use lineage_journal::{replay, JournalConfig};

/// Run the replay command.
pub fn run(config: &JournalConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = replay(config)?;

    println!("Journal Replay");
    println!("--------------");
    println!("  Path:            {}", config.journal_path().display());
    println!("  Entries applied: {}", state.applied);
    println!("  Entries skipped: {}", state.skipped);
    println!("  Lineages:        {}", state.lineages.len());
    println!("  Next lineage id: {}", state.id_generator.sequence_number());
    match state.last_sequence {
        Some(seq) => println!("  Last sequence:   {}", seq),
        None => println!("  Last sequence:   (empty journal)"),
    }

    Ok(())
}
