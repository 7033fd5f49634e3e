use crate::{BlockInfo, Log};
use serde::{Deserialize, Serialize};

/// A committed diff of the tracked chain suffix.
///
/// `removed` lists the blocks rolled back by a reorg, newest first;
/// `added` lists the blocks that extended the canonical window, oldest
/// first. `added_logs` and `removed_logs` carry the filtered logs of
/// those blocks in the same block order, preserving each block's
/// internal log order.
///
/// Updates are emitted in commit order and are idempotent keyed by the
/// added/removed block hashes: after a restart the tracker may re-emit
/// an update whose persistence was not durably acknowledged, but never
/// one that was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainUpdate {
    /// Blocks appended to the window, oldest first.
    pub added: Vec<BlockInfo>,
    /// Blocks rolled back from the window, newest first.
    pub removed: Vec<BlockInfo>,
    /// Filtered logs of the added blocks, partitioned by block.
    pub added_logs: Vec<Log>,
    /// Logs of the removed blocks, as previously stored.
    pub removed_logs: Vec<Log>,
}

impl ChainUpdate {
    /// Returns `true` if the update carries no block transitions.
    ///
    /// An empty update is never published.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Returns `true` if the update rolled blocks back.
    pub fn is_reorg(&self) -> bool {
        !self.removed.is_empty()
    }

    /// Returns the update that undoes `self`.
    ///
    /// Applying an update and then its inverse restores the pre-update
    /// window and log stream.
    pub fn inverse(&self) -> Self {
        Self {
            added: self.removed.iter().rev().copied().collect(),
            removed: self.added.iter().rev().copied().collect(),
            added_logs: self.removed_logs.iter().rev().cloned().collect(),
            removed_logs: self.added_logs.iter().rev().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    fn block(number: u64) -> BlockInfo {
        BlockInfo::new(B256::repeat_byte(number as u8), number, B256::repeat_byte(number as u8 - 1))
    }

    #[test]
    fn inverse_swaps_and_reverses() {
        let update = ChainUpdate {
            added: vec![block(3), block(4)],
            removed: vec![block(6), block(5)],
            ..Default::default()
        };
        let inverse = update.inverse();
        assert_eq!(inverse.added, vec![block(5), block(6)]);
        assert_eq!(inverse.removed, vec![block(4), block(3)]);
        assert_eq!(inverse.inverse(), update);
    }

    #[test]
    fn empty_means_no_block_transitions() {
        assert!(ChainUpdate::default().is_empty());
        let update = ChainUpdate { added: vec![block(2)], ..Default::default() };
        assert!(!update.is_empty());
        assert!(!update.is_reorg());
    }
}
