// crates/lineage-cli/src/main.rs
//
// CLI entrypoint for the lineage journal tools.
//
// Initializes tracing, parses CLI arguments, loads the journal
// configuration, and dispatches to the submit, inspect, or replay command.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::inspect::InspectCmd;
use commands::submit::SubmitCmd;
use lineage_journal::JournalConfig;

/// Lineage journal tools: record job lineage and inspect the write-ahead log.
#[derive(Parser, Debug)]
#[command(
    name = "lineage",
    version = "0.1.0",
    about = "Record command-line job lineage and inspect the lineage journal"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "~/.lineage/config.toml")]
    config: String,

    /// Journal directory; overrides the config file value.
    #[arg(long, global = true)]
    journal_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Record a command-line job's lineage in the journal.
    Submit(SubmitCmd),

    /// List the entries in the journal.
    Inspect(InspectCmd),

    /// Replay the journal and summarize the recovered state.
    Replay,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration before tracing so its log level can act as the
    // fallback filter; the outcome is logged once tracing is up.
    let loaded = JournalConfig::load(&cli.config);
    let mut config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => JournalConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match loaded {
        Ok(_) => tracing::debug!("Loaded configuration from {}", cli.config),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            cli.config,
            e
        ),
    }

    // CLI --journal-dir flag overrides the config file value.
    if let Some(dir) = cli.journal_dir {
        config.journal_dir = dir;
    }
    tracing::debug!("Journal path: {}", config.journal_path().display());

    match &cli.command {
        Commands::Submit(cmd) => commands::submit::run(&config, cmd)?,
        Commands::Inspect(cmd) => commands::inspect::run(&config, cmd)?,
        Commands::Replay => commands::replay::run(&config)?,
    }

    Ok(())
}
