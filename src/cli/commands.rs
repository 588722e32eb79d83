//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// streamsink command-line interface
#[derive(Debug, Parser)]
#[command(name = "streamsink", version, about = "Land record streams in columnar object storage")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write JSONL records to the configured destination
    Write {
        /// Path to the destination config YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Name of the stream being written
        #[arg(short, long)]
        stream: String,

        /// Path to the resolved schema JSON for the stream
        #[arg(long)]
        schema: PathBuf,

        /// JSONL input file (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}
