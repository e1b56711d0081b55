use std::io::{self, Write};

use serde::Serialize;

use crate::analysis::ConfigurationSummary;
use crate::app::{GroupingResult, ProgressEvent, ProgressSink};
use crate::domain::FileRecord;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_grouping(result: &GroupingResult) -> io::Result<()> {
        Self::print_json(&result.channels)
    }

    pub fn print_summary(summary: &ConfigurationSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    pub fn print_records(records: &[FileRecord]) -> io::Result<()> {
        Self::print_json(&records)
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Forwards progress to `tracing` at info level.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => {
                tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message)
            }
            None => tracing::info!("{}", event.message),
        }
    }
}
