//! # heapfill — bounded-memory allocation lab
//!
//! Reproduces the observable contract of the classic "allocate until the
//! runtime gives up" demonstration, portably: instead of racing the host
//! allocator, every block is charged against a fixed byte budget, and
//! crossing the budget raises the same exhaustion condition a constrained
//! heap would. The host allocator stays in the loop as a second, real limit.
//!
//! ## Observable contract
//!
//! 1. Allocate fixed-size blocks in an unbounded loop
//! 2. Retain every block in an append-only sequence (nothing is reclaimable)
//! 3. Report each successful allocation as it happens
//! 4. On exhaustion: report a summary exactly once and return normally
//!
//! ## Usage example
//!
//! ```
//! use heapfill::progress::RecordingSink;
//! use heapfill::{FillConfig, FillDriver};
//!
//! let driver = FillDriver::new(FillConfig::new(1024, 8 * 1024))?;
//! let mut sink = RecordingSink::new();
//! let report = driver.run(&mut sink);
//! assert_eq!(report.blocks_allocated, 8);
//! assert!(report.is_consistent());
//! # Ok::<(), heapfill::MemoryError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod block;     // Fixed-size blocks and the retained sequence
pub mod budget;    // Byte accounting against a fixed ceiling
pub mod pipeline;  // Lazy-sequence demo
pub mod progress;  // Allocation progress reporting

// Re-exports for convenience
pub use block::{Block, RetainedBlocks};
pub use budget::{BudgetTracker, UsageProfile};
pub use progress::{ConsoleSink, ProgressSink};

use thiserror::Error;
use tracing::debug;

/// Runs the fill loop until the budget is exhausted
///
/// Owns the budget tracker; consumed by [`FillDriver::run`] so a run cannot
/// be restarted on top of its own leftovers.
#[derive(Debug)]
pub struct FillDriver {
    config: FillConfig,
    tracker: budget::BudgetTracker,
}

/// Configuration parameters for one fill run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct FillConfig {
    /// Bytes per block
    pub block_bytes: usize,

    /// Total byte budget the run may consume
    pub budget_bytes: usize,

    /// Enable usage profiling
    pub profile: bool,
}

impl FillConfig {
    /// Create configuration with profiling off
    pub fn new(block_bytes: usize, budget_bytes: usize) -> Self {
        Self {
            block_bytes,
            budget_bytes,
            profile: false,
        }
    }

    /// Enable usage profiling
    pub fn with_profile(mut self) -> Self {
        self.profile = true;
        self
    }

    /// Blocks a run under this configuration will retain: ⌊budget / block⌋
    pub fn blocks_expected(&self) -> usize {
        self.budget_bytes / self.block_bytes
    }

    /// Fail fast on a configuration the loop could not run with
    ///
    /// Configuration errors are distinct from exhaustion: they are reported
    /// before any allocation happens and zero blocks are allocated.
    pub fn validate(&self) -> Result<(), MemoryError> {
        if self.block_bytes == 0 {
            return Err(MemoryError::InvalidBlockSize(self.block_bytes));
        }
        if self.budget_bytes == 0 {
            return Err(MemoryError::InvalidBudget {
                block_bytes: self.block_bytes,
                budget_bytes: self.budget_bytes,
            });
        }
        Ok(())
    }
}

/// Result of a completed fill run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct FillReport {
    /// Successful allocations (the counter)
    pub blocks_allocated: u64,

    /// Length of the retained sequence at exhaustion
    pub blocks_retained: usize,

    /// Configured block size in bytes
    pub block_bytes: usize,

    /// Bytes in use at exhaustion
    pub bytes_used: usize,

    /// Peak bytes in use during the run
    pub peak_bytes: usize,

    /// Usage profile (if enabled)
    pub profile: Option<budget::UsageProfile>,
}

impl FillReport {
    /// Verify no blocks were lost or double-counted
    pub fn is_consistent(&self) -> bool {
        self.blocks_allocated == self.blocks_retained as u64
    }
}

/// Errors that can occur around the fill loop
#[derive(Error, Debug)]
pub enum MemoryError {
    /// Block size of zero bytes
    #[error("invalid block size {0}: blocks must be at least one byte")]
    InvalidBlockSize(usize),

    /// Budget that no run could ever charge against
    #[error("invalid budget {budget_bytes} for block size {block_bytes}: budget must be at least one byte")]
    InvalidBudget {
        /// Configured block size
        block_bytes: usize,
        /// Configured budget
        budget_bytes: usize,
    },

    /// A charge that cannot be satisfied (resource exhaustion)
    #[error("memory budget exhausted: requested {requested} bytes with {used} of {budget} in use")]
    BudgetExhausted {
        /// Bytes the failing allocation asked for
        requested: usize,
        /// Bytes in use when the request was refused
        used: usize,
        /// The configured budget
        budget: usize,
    },
}

impl FillDriver {
    /// Create a driver, failing fast on invalid configuration
    pub fn new(config: FillConfig) -> Result<Self, MemoryError> {
        config.validate()?;

        let tracker = budget::BudgetTracker::new(config.budget_bytes, config.profile);
        Ok(Self { config, tracker })
    }

    /// Run the fill loop to exhaustion
    ///
    /// The loop has no bound of its own; the finite budget is what
    /// guarantees termination. Exhaustion is the expected outcome, handled
    /// exactly once right here: the sink is told, a report is built, and the
    /// routine returns normally instead of propagating the condition.
    ///
    /// If even the first allocation is refused, the counter stays at 0 and
    /// the summary is still emitted.
    pub fn run(mut self, sink: &mut dyn ProgressSink) -> FillReport {
        let block_bytes = self.config.block_bytes;
        let mut retained = RetainedBlocks::new();
        let mut counter: u64 = 0;

        debug!(
            block_bytes,
            budget_bytes = self.config.budget_bytes,
            "starting fill loop"
        );

        let cause = loop {
            match Block::claim(&mut self.tracker, block_bytes) {
                Ok(block) => {
                    retained.push(block);
                    counter += 1;
                    self.tracker.record_block(counter);
                    sink.block_allocated(counter);
                }
                Err(cause) => break cause,
            }
        };

        debug!(%cause, blocks = counter, "fill loop stopped");

        let report = FillReport {
            blocks_allocated: counter,
            blocks_retained: retained.len(),
            block_bytes,
            bytes_used: self.tracker.used(),
            peak_bytes: self.tracker.peak(),
            profile: self.tracker.take_profile(),
        };
        sink.exhausted(&report, &cause);

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingSink;
    use proptest::prelude::*;
    use test_case::test_case;

    fn run_with(block_bytes: usize, budget_bytes: usize) -> (FillReport, RecordingSink) {
        let driver = FillDriver::new(FillConfig::new(block_bytes, budget_bytes)).unwrap();
        let mut sink = RecordingSink::new();
        let report = driver.run(&mut sink);
        (report, sink)
    }

    #[test]
    fn test_blocks_expected() {
        let config = FillConfig::new(1024, 10 * 1024);
        assert_eq!(config.blocks_expected(), 10);

        // Remainders are discarded, not rounded up
        assert_eq!(FillConfig::new(1024, 10 * 1024 + 1023).blocks_expected(), 10);
    }

    #[test]
    fn test_zero_block_size_fails_fast() {
        let err = FillDriver::new(FillConfig::new(0, 1024)).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidBlockSize(0)));
    }

    #[test]
    fn test_zero_budget_fails_fast() {
        let err = FillDriver::new(FillConfig::new(1024, 0)).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidBudget { .. }));
    }

    #[test_case(1024, 8 * 1024 => 8 ; "even division")]
    #[test_case(1024, 8 * 1024 - 1 => 7 ; "remainder discarded")]
    #[test_case(4096, 1024 => 0 ; "first allocation already fails")]
    fn fill_counter(block_bytes: usize, budget_bytes: usize) -> u64 {
        let (report, _) = run_with(block_bytes, budget_bytes);
        report.blocks_allocated
    }

    #[test]
    fn test_report_is_consistent_at_exhaustion() {
        let (report, _) = run_with(512, 64 * 512);

        assert!(report.is_consistent());
        assert_eq!(report.blocks_allocated, 64);
        assert_eq!(report.bytes_used, 64 * 512);
        assert_eq!(report.peak_bytes, 64 * 512);
        assert_eq!(report.block_bytes, 512);
    }

    #[test]
    fn test_summary_emitted_exactly_once() {
        let (_, sink) = run_with(1024, 4 * 1024);
        assert_eq!(sink.summaries.len(), 1);
    }

    #[test]
    fn test_counter_zero_still_summarizes() {
        // A block larger than the whole budget: exhaustion on attempt one
        let (report, sink) = run_with(8 * 1024, 1024);

        assert_eq!(report.blocks_allocated, 0);
        assert_eq!(report.blocks_retained, 0);
        assert!(report.is_consistent());
        assert!(sink.allocated.is_empty());
        assert_eq!(sink.summaries.len(), 1);
    }

    #[test]
    fn test_identical_runs_agree() {
        let (first, _) = run_with(768, 100 * 1024);
        let (second, _) = run_with(768, 100 * 1024);

        assert_eq!(first.blocks_allocated, second.blocks_allocated);
        assert_eq!(first.bytes_used, second.bytes_used);
    }

    #[test]
    fn test_profile_collected_when_enabled() {
        let config = FillConfig::new(1024, 4 * 1024).with_profile();
        let driver = FillDriver::new(config).unwrap();
        let report = driver.run(&mut RecordingSink::new());

        let profile = report.profile.expect("profiling was enabled");
        assert_eq!(profile.timeline.len() as u64, report.blocks_allocated);
        assert_eq!(profile.peak_bytes, report.peak_bytes);
        assert!(profile.within_budget(4 * 1024));
    }

    proptest! {
        #[test]
        fn prop_counter_matches_retained_and_budget(
            block_bytes in 1usize..4096,
            budget_bytes in 1usize..64 * 1024,
        ) {
            let (report, sink) = run_with(block_bytes, budget_bytes);

            // No blocks lost or double-counted, under any geometry
            prop_assert!(report.is_consistent());
            prop_assert_eq!(report.blocks_allocated as usize, budget_bytes / block_bytes);
            prop_assert_eq!(sink.summaries.len(), 1);
            prop_assert!(report.bytes_used <= budget_bytes);
        }
    }
}
