// crates/lineage-cli/src/commands/mod.rs
//
// Subcommand implementations for the lineage CLI.

pub mod inspect;
pub mod replay;
pub mod submit;
