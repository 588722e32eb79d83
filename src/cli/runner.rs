//! Command execution

use crate::cli::{Cli, Command};
use crate::config::{DestinationConfig, SchemaSpec};
use crate::error::Result;
use crate::sink::CloudSink;
use crate::stream::{ParquetStreamWriter, StreamWriter};
use crate::types::RecordMessage;
use std::io::{BufRead, BufReader};
use std::path::Path;
use uuid::Uuid;

/// Executes a parsed CLI invocation
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a runner for the parsed arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected command
    pub async fn run(self) -> Result<()> {
        match self.cli.command {
            Command::Write {
                config,
                stream,
                schema,
                input,
            } => run_write(&config, &stream, &schema, input.as_deref()).await,
        }
    }
}

async fn run_write(
    config_path: &Path,
    stream: &str,
    schema_path: &Path,
    input: Option<&Path>,
) -> Result<()> {
    let config = DestinationConfig::from_yaml_file(config_path)?;
    let schema = SchemaSpec::from_json_file(schema_path)?.to_arrow()?;
    let sink = CloudSink::parse(&config.destination)?;

    let mut writer = ParquetStreamWriter::open(
        &sink,
        stream,
        schema,
        &config.format,
        config.unknown_field_policy,
    )
    .await?;

    let reader: Box<dyn BufRead> = match input {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let mut written = 0usize;
    for line in reader.lines() {
        let result = line
            .map_err(crate::error::Error::from)
            .and_then(|line| write_line(&mut writer, stream, &line));
        match result {
            Ok(()) => written += 1,
            Err(e) => {
                tracing::error!(stream, error = %e, "Record failed; aborting stream");
                if let Err(close_err) = writer.close(true).await {
                    tracing::warn!(stream, error = %close_err, "Abort cleanup failed");
                }
                return Err(e);
            }
        }
    }

    writer.close(false).await?;
    tracing::info!(stream, rows = written, key = writer.object_key(), "Write finished");
    Ok(())
}

fn write_line(writer: &mut ParquetStreamWriter, stream: &str, line: &str) -> Result<()> {
    if line.trim().is_empty() {
        return Ok(());
    }
    // Either a full record message or a bare payload emitted now
    let record = match serde_json::from_str::<RecordMessage>(line) {
        Ok(record) => record,
        Err(_) => RecordMessage::emitted_now(stream, serde_json::from_str(line)?),
    };
    writer.write(Uuid::new_v4(), &record)
}
