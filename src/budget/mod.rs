//! Budget accounting and usage profiling
//!
//! Tracks bytes charged against a fixed ceiling

mod tracker;

pub use tracker::BudgetTracker;

/// Detailed usage profile (if enabled)
#[derive(Debug, Clone)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct UsageProfile {
    /// Peak bytes in use
    pub peak_bytes: usize,

    /// Bytes in use after each retained block (snapshots)
    pub timeline: Vec<(u64, usize)>, // (ordinal, bytes_in_use)

    /// Largest single charge accepted
    pub largest_charge: usize,
}

impl UsageProfile {
    /// Verify the run stayed inside the budget
    pub fn within_budget(&self, budget: usize) -> bool {
        self.peak_bytes <= budget
    }

    /// Generate report
    pub fn report(&self) -> String {
        format!(
            "Peak usage: {} bytes\nLargest charge: {} bytes\nSnapshots: {}",
            self.peak_bytes,
            self.largest_charge,
            self.timeline.len()
        )
    }
}
