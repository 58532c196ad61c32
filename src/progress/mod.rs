//! Allocation progress reporting
//!
//! The fill loop talks to the outside world through `ProgressSink`, so the
//! same loop drives the console demo, the tests, and the benchmarks.

use crate::{FillReport, MemoryError};

/// Observer for fill-loop events
pub trait ProgressSink {
    /// Called once per successfully retained block, in order
    fn block_allocated(&mut self, ordinal: u64);

    /// Called exactly once, when the run hits exhaustion
    fn exhausted(&mut self, report: &FillReport, cause: &MemoryError);
}

/// Writes progress to stdout and the final summary to stderr
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn block_allocated(&mut self, ordinal: u64) {
        println!("Allocated object #{ordinal}");
    }

    fn exhausted(&mut self, report: &FillReport, cause: &MemoryError) {
        eprintln!(
            "Budget exhausted after allocating {} blocks; retained {}, block size {} bytes",
            report.blocks_allocated, report.blocks_retained, report.block_bytes
        );
        eprintln!("{cause}");
    }
}

/// Captures sink events for inspection in tests
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Ordinals reported through `block_allocated`, in arrival order
    pub allocated: Vec<u64>,

    /// One entry per `exhausted` call
    pub summaries: Vec<FillReport>,
}

impl RecordingSink {
    /// Create empty sink
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for RecordingSink {
    fn block_allocated(&mut self, ordinal: u64) {
        self.allocated.push(ordinal);
    }

    fn exhausted(&mut self, report: &FillReport, _cause: &MemoryError) {
        self.summaries.push(report.clone());
    }
}

/// Discards every event (benchmarks)
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn block_allocated(&mut self, _ordinal: u64) {}

    fn exhausted(&mut self, _report: &FillReport, _cause: &MemoryError) {}
}
