//! CSV trace backend.
//!
//! Creates two files in the configured output directory:
//! - `movement_trace.csv`
//! - `tick_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::TraceWriter;
use crate::{OutputResult, TickSummaryRow, TraceRow};

pub const TRACE_FILE: &str = "movement_trace.csv";
pub const SUMMARY_FILE: &str = "tick_summaries.csv";

/// Writes a movement trace to two CSV files.
pub struct CsvTraceWriter {
    events:    Writer<File>,
    summaries: Writer<File>,
}

impl CsvTraceWriter {
    /// Create the two CSV files in `dir` (which must exist) and write the
    /// header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut events = Writer::from_path(dir.join(TRACE_FILE))?;
        events.write_record(["tick", "agent_id", "event", "x", "y"])?;

        let mut summaries = Writer::from_path(dir.join(SUMMARY_FILE))?;
        summaries.write_record(["tick", "advanced", "yielded", "completed", "failed", "active"])?;

        Ok(Self { events, summaries })
    }
}

impl TraceWriter for CsvTraceWriter {
    fn write_event(&mut self, row: &TraceRow) -> OutputResult<()> {
        // Yields and completions carry no cell; leave x/y empty.
        let (x, y) = match row.cell {
            Some(c) => (c.x.to_string(), c.y.to_string()),
            None => (String::new(), String::new()),
        };
        self.events.write_record(&[
            row.tick.to_string(),
            row.agent_id.to_string(),
            row.event.as_str().to_owned(),
            x,
            y,
        ])?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.advanced.to_string(),
            row.yielded.to_string(),
            row.completed.to_string(),
            row.failed.to_string(),
            row.active.to_string(),
        ])?;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.events.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
