//! The `TraceWriter` trait implemented by trace backends.

use crate::{OutputResult, TickSummaryRow, TraceRow};

/// A sink for trace rows.
///
/// Errors are stored by [`TraceObserver`][crate::TraceObserver] and read back
/// through [`TraceErrors::take`][crate::TraceErrors::take].
pub trait TraceWriter: Send {
    fn write_event(&mut self, row: &TraceRow) -> OutputResult<()>;

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Push buffered rows to the underlying files.
    fn flush(&mut self) -> OutputResult<()>;
}
