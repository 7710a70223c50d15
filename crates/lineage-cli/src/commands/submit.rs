// crates/lineage-cli/src/commands/submit.rs
//
// `lineage submit` — record a command-line job's lineage in the journal.

use clap::Args;

use lineage_core::{CommandLineJob, JobConf, Lineage};
use lineage_journal::{JournalConfig, LineageJournal};

/// Arguments for the submit command.
#[derive(Debug, Args)]
pub struct SubmitCmd {
    /// Shell command the job runs.
    #[arg(long)]
    pub command: String,

    /// Path the job writes its output to.
    #[arg(long)]
    pub output_path: String,

    /// Input file ids, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub inputs: Vec<u64>,

    /// Output file ids, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub outputs: Vec<u64>,
}

/// Run the submit command.
pub fn run(config: &JournalConfig, cmd: &SubmitCmd) -> Result<(), Box<dyn std::error::Error>> {
    let (mut journal, state) = LineageJournal::open(config)?;

    let id = state.id_generator.generate_id();
    let job = CommandLineJob::new(cmd.command.as_str(), JobConf::new(cmd.output_path.as_str()));
    let lineage = Lineage::builder(id)
        .input_files(cmd.inputs.clone())
        .output_files(cmd.outputs.clone())
        .job(job)
        .build()?;

    // The advanced id sequence must be durable before the lineage using it.
    journal.append_id_generator(&state.id_generator)?;
    let sequence = journal.append_lineage(&lineage)?;

    tracing::info!(lineage_id = id, sequence, "lineage recorded");
    println!("Recorded lineage {} (journal sequence {})", id, sequence);
    Ok(())
}
