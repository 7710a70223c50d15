// crates/lineage-cli/src/commands/inspect.rs
//
// `lineage inspect` — list the entries in the journal, in append order.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use lineage_core::{journal_entry, JournalEntry, Lineage};
use lineage_journal::{JournalConfig, JournalReader};

use crate::output::{format_ids, format_json, format_table, OutputFormat};

/// Arguments for the inspect command.
#[derive(Debug, Args)]
pub struct InspectCmd {
    /// Print entries as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// One journal entry, as printed in JSON mode.
#[derive(Debug, Serialize)]
pub struct EntryView {
    pub sequence: Option<u64>,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineage: Option<LineageView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_lineage_id: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct LineageView {
    pub id: u64,
    pub input_files: Vec<u64>,
    pub job_command: String,
    pub job_output_path: String,
    pub creation_time_ms: u64,
    pub created_at: Option<String>,
}

/// One journal entry, as printed in table mode.
#[derive(Debug, Tabled)]
pub struct EntryRow {
    #[tabled(rename = "seq")]
    pub sequence: String,
    pub kind: String,
    #[tabled(rename = "lineage")]
    pub lineage_id: String,
    pub inputs: String,
    pub command: String,
    #[tabled(rename = "output path")]
    pub output_path: String,
    pub created: String,
}

impl EntryView {
    /// Build a view of an entry. Lineage payloads are decoded through the
    /// same path replay uses, so a corrupt entry fails here too.
    pub fn from_entry(entry: &JournalEntry) -> Result<Self, lineage_core::LineageError> {
        let mut view = EntryView {
            sequence: entry.sequence_number,
            kind: entry.kind(),
            lineage: None,
            next_lineage_id: None,
        };
        match &entry.entry {
            Some(journal_entry::Entry::Lineage(lineage_entry)) => {
                let lineage = Lineage::from_journal_entry(lineage_entry)?;
                view.lineage = Some(LineageView::from(&lineage));
            }
            Some(journal_entry::Entry::LineageIdGenerator(generator)) => {
                view.next_lineage_id = generator.sequence_number;
            }
            None => {}
        }
        Ok(view)
    }
}

impl From<&Lineage> for LineageView {
    fn from(lineage: &Lineage) -> Self {
        let conf = lineage.job().conf();
        LineageView {
            id: lineage.id(),
            input_files: lineage.input_files().to_vec(),
            job_command: lineage.job().command().to_string(),
            job_output_path: conf.output_file_path.clone(),
            creation_time_ms: lineage.creation_time(),
            created_at: lineage.created_at().map(|t| t.to_rfc3339()),
        }
    }
}

impl From<&EntryView> for EntryRow {
    fn from(view: &EntryView) -> Self {
        let dash = || "-".to_string();
        let sequence = view.sequence.map_or_else(dash, |s| s.to_string());
        match &view.lineage {
            Some(lineage) => EntryRow {
                sequence,
                kind: view.kind.to_string(),
                lineage_id: lineage.id.to_string(),
                inputs: format_ids(&lineage.input_files),
                command: lineage.job_command.clone(),
                output_path: lineage.job_output_path.clone(),
                created: lineage
                    .created_at
                    .clone()
                    .unwrap_or_else(|| lineage.creation_time_ms.to_string()),
            },
            None => EntryRow {
                sequence,
                kind: view.kind.to_string(),
                lineage_id: view
                    .next_lineage_id
                    .map_or_else(dash, |id| format!("next={}", id)),
                inputs: dash(),
                command: dash(),
                output_path: dash(),
                created: dash(),
            },
        }
    }
}

/// Run the inspect command.
pub fn run(config: &JournalConfig, cmd: &InspectCmd) -> Result<(), Box<dyn std::error::Error>> {
    let reader = JournalReader::open(config.journal_path(), config.tolerate_torn_tail)?;

    let mut views = Vec::new();
    for entry in reader {
        views.push(EntryView::from_entry(&entry?)?);
    }

    match OutputFormat::from_json_flag(cmd.json) {
        OutputFormat::Json => println!("{}", format_json(&views)),
        OutputFormat::Table => {
            if views.is_empty() {
                println!("Journal {} is empty.", config.journal_path().display());
            } else {
                let rows: Vec<EntryRow> = views.iter().map(EntryRow::from).collect();
                println!("{}", format_table(&rows));
            }
        }
    }

    Ok(())
}
