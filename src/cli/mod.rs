//! Command-line interface
//!
//! The `write` command drives one stream writer from newline-delimited JSON
//! input. Pipeline orchestration (retries, multi-stream scheduling) lives
//! outside this binary.

mod commands;
mod runner;

pub use commands::{Cli, Command};
pub use runner::Runner;
