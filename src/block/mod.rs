//! Fixed-size blocks and the append-only retained sequence
//!
//! Every block is charged against the budget before it is allocated, and
//! every retained block stays live until the run ends. Memory pressure can
//! therefore only grow.

use crate::budget::BudgetTracker;
use crate::MemoryError;

/// One fixed-size zero-filled heap allocation
#[derive(Debug)]
pub struct Block {
    bytes: Vec<u8>,
}

impl Block {
    /// Allocate a block, charging `tracker` first
    ///
    /// The budget debit happens before the host allocation. If the host
    /// allocator itself refuses, the debit is refunded and the failure
    /// surfaces as the same exhaustion condition a crossed budget would:
    /// callers see one condition regardless of which limit fired.
    pub fn claim(tracker: &mut BudgetTracker, bytes: usize) -> Result<Self, MemoryError> {
        tracker.try_charge(bytes)?;

        let mut buf = Vec::new();
        if buf.try_reserve_exact(bytes).is_err() {
            tracker.credit(bytes);
            return Err(MemoryError::BudgetExhausted {
                requested: bytes,
                used: tracker.used(),
                budget: tracker.budget(),
            });
        }
        buf.resize(bytes, 0);

        Ok(Self { bytes: buf })
    }

    /// Size of the block in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the block holds no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Append-only ordered sequence of retained blocks
///
/// Grows by one block per successful allocation and is never truncated
/// during a run; the blocks are released together when the sequence drops.
#[derive(Debug, Default)]
pub struct RetainedBlocks {
    blocks: Vec<Block>,
}

impl RetainedBlocks {
    /// Create empty sequence
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Append a block; blocks can never be removed
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Number of retained blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no blocks are retained
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total bytes held across all retained blocks
    pub fn bytes_retained(&self) -> usize {
        self.blocks.iter().map(Block::len).sum()
    }
}
