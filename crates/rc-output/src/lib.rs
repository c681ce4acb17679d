//! `rc-output`: movement trace writers.
//!
//! | Module       | Contents                                             |
//! |--------------|------------------------------------------------------|
//! | [`row`]      | `TraceRow`, `TraceEvent`, `TickSummaryRow`           |
//! | [`writer`]   | The `TraceWriter` backend trait                      |
//! | [`csv`]      | `CsvTraceWriter`                                     |
//! | [`observer`] | `TraceObserver`, an `EngineObserver` driving a writer |
//!
//! The CSV backend creates `movement_trace.csv` and `tick_summaries.csv`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rc_output::{CsvTraceWriter, TraceObserver};
//!
//! let trace = TraceObserver::new(CsvTraceWriter::new(Path::new("./trace"))?);
//! let errors = trace.errors();
//! let engine = EngineBuilder::new(config, geometry, positions).observer(trace).build()?;
//! // … run, shut down, await the engine task …
//! if let Some(e) = errors.take() { eprintln!("trace error: {e}"); }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvTraceWriter;
pub use error::{OutputError, OutputResult};
pub use observer::{TraceErrors, TraceObserver};
pub use row::{TickSummaryRow, TraceEvent, TraceRow};
pub use writer::TraceWriter;
