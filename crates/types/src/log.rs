use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

/// A single log emitted by a block, as admitted to the tracker.
///
/// Logs inherit the hash and number of their containing block. The
/// `log_index` is the log's position within that block, in the order the
/// provider reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Hash of the block that contains this log.
    pub block_hash: B256,
    /// Number of the block that contains this log.
    pub block_number: u64,
    /// Address of the contract that emitted the log.
    pub address: Address,
    /// Indexed topics, at most four.
    pub topics: Vec<B256>,
    /// Unindexed payload.
    pub data: Bytes,
    /// Position of the log within its block.
    pub log_index: u32,
}

impl Log {
    /// Returns the topic at `slot`, if the log carries one.
    pub fn topic(&self, slot: usize) -> Option<&B256> {
        self.topics.get(slot)
    }
}
