use alloy_primitives::B256;
use scout_types::BlockInfo;
use std::collections::VecDeque;
use thiserror::Error;

/// Errors raised by [`BlockWindow`] mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    /// The appended block does not extend the current cursor.
    #[error("block {block} does not extend cursor {cursor}")]
    NonContiguous {
        /// The current cursor.
        cursor: BlockInfo,
        /// The rejected block.
        block: BlockInfo,
    },

    /// The window holds no blocks.
    #[error("window is empty")]
    Empty,

    /// A restored snapshot violated the adjacency invariant.
    #[error("snapshot is not parent-linked at number {number}")]
    CorruptSnapshot {
        /// Number of the first entry that failed validation.
        number: u64,
    },
}

/// Bounded ring of the most recent canonical block headers.
///
/// Entries are ordered oldest first and satisfy the adjacency
/// invariant: consecutive numbers and matching parent hashes. The last
/// entry is the cursor. Appends past `max_backlog` evict from the
/// front; eviction is the tracker's operational definition of finality,
/// evicted blocks cannot be rolled back.
#[derive(Debug, Clone)]
pub struct BlockWindow {
    blocks: VecDeque<BlockInfo>,
    max_backlog: usize,
}

impl BlockWindow {
    /// Creates an empty window retaining at most `max_backlog` headers.
    pub fn new(max_backlog: usize) -> Self {
        assert!(max_backlog > 0, "backlog must be positive");
        Self { blocks: VecDeque::with_capacity(max_backlog), max_backlog }
    }

    /// Rebuilds a window from a persisted snapshot, validating the
    /// adjacency invariant and trimming to the newest `max_backlog`
    /// entries.
    pub fn restore(max_backlog: usize, snapshot: Vec<BlockInfo>) -> Result<Self, WindowError> {
        let mut window = Self::new(max_backlog);
        for block in snapshot {
            window.append(block).map_err(|_| WindowError::CorruptSnapshot { number: block.number })?;
        }
        Ok(window)
    }

    /// Appends `block` to the back of the window.
    ///
    /// The first block of an empty window is admitted unconditionally;
    /// its parent hash is retained for later child validation. Every
    /// other append must be the direct child of the cursor. Exceeding
    /// `max_backlog` evicts from the front.
    pub fn append(&mut self, block: BlockInfo) -> Result<(), WindowError> {
        if let Some(cursor) = self.blocks.back() {
            if !block.is_child_of(cursor) {
                return Err(WindowError::NonContiguous { cursor: *cursor, block });
            }
        }
        self.blocks.push_back(block);
        while self.blocks.len() > self.max_backlog {
            self.blocks.pop_front();
        }
        Ok(())
    }

    /// Removes and returns the cursor.
    pub fn pop_back(&mut self) -> Result<BlockInfo, WindowError> {
        self.blocks.pop_back().ok_or(WindowError::Empty)
    }

    /// Returns the cursor, the newest tracked block.
    pub fn cursor(&self) -> Option<&BlockInfo> {
        self.blocks.back()
    }

    /// Returns the oldest tracked block.
    pub fn oldest(&self) -> Option<&BlockInfo> {
        self.blocks.front()
    }

    /// Returns the index of the entry with the given hash.
    pub fn find_by_hash(&self, hash: B256) -> Option<usize> {
        self.blocks.iter().position(|block| block.hash == hash)
    }

    /// Returns the entry with the given number.
    pub fn get_by_number(&self, number: u64) -> Option<&BlockInfo> {
        // Adjacency makes numbers dense, so the offset is direct.
        let first = self.blocks.front()?.number;
        let index = number.checked_sub(first)?;
        self.blocks.get(index as usize)
    }

    /// Returns `true` iff some entry has the given number.
    pub fn contains_number(&self, number: u64) -> bool {
        self.get_by_number(number).is_some()
    }

    /// Returns an immutable copy of the window, oldest first.
    pub fn snapshot(&self) -> Vec<BlockInfo> {
        self.blocks.iter().copied().collect()
    }

    /// Number of tracked headers.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if no headers are tracked.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Maximum number of headers retained.
    pub const fn max_backlog(&self) -> usize {
        self.max_backlog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::blocks;

    #[test]
    fn append_enforces_adjacency() {
        let chain = blocks(1, 4);
        let mut window = BlockWindow::new(10);
        window.append(chain[0]).unwrap();
        window.append(chain[1]).unwrap();

        // Skipping a number is rejected.
        let err = window.append(chain[3]).unwrap_err();
        assert!(matches!(err, WindowError::NonContiguous { .. }));

        // A matching child is accepted.
        window.append(chain[2]).unwrap();
        assert_eq!(window.cursor().unwrap().number, 3);
    }

    #[test]
    fn first_append_bypasses_parent_check() {
        let mut window = BlockWindow::new(10);
        let chain = blocks(90, 92);
        window.append(chain[0]).unwrap();
        assert_eq!(window.len(), 1);
        window.append(chain[1]).unwrap();
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn eviction_is_fifo_and_bounded() {
        let mut window = BlockWindow::new(5);
        for block in blocks(1, 10) {
            window.append(block).unwrap();
        }
        assert_eq!(window.len(), 5);
        assert_eq!(window.oldest().unwrap().number, 6);
        assert_eq!(window.cursor().unwrap().number, 10);
    }

    #[test]
    fn pop_back_returns_cursor_then_errors_on_empty() {
        let mut window = BlockWindow::new(5);
        for block in blocks(1, 2) {
            window.append(block).unwrap();
        }
        assert_eq!(window.pop_back().unwrap().number, 2);
        assert_eq!(window.pop_back().unwrap().number, 1);
        assert_eq!(window.pop_back().unwrap_err(), WindowError::Empty);
    }

    #[test]
    fn lookup_by_hash_and_number() {
        let chain = blocks(5, 8);
        let mut window = BlockWindow::new(10);
        for block in &chain {
            window.append(*block).unwrap();
        }
        assert_eq!(window.find_by_hash(chain[2].hash), Some(2));
        assert_eq!(window.find_by_hash(alloy_primitives::B256::repeat_byte(0xff)), None);
        assert_eq!(window.get_by_number(6), Some(&chain[1]));
        assert!(window.contains_number(8));
        assert!(!window.contains_number(9));
        assert!(!window.contains_number(4));
    }

    #[test]
    fn restore_validates_snapshot() {
        let chain = blocks(1, 3);
        let window = BlockWindow::restore(10, chain.clone()).unwrap();
        assert_eq!(window.snapshot(), chain);

        let mut corrupt = chain;
        corrupt[2].parent_hash = alloy_primitives::B256::repeat_byte(0xff);
        let err = BlockWindow::restore(10, corrupt).unwrap_err();
        assert_eq!(err, WindowError::CorruptSnapshot { number: 3 });
    }
}
