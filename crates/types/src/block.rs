use alloy_eips::BlockNumHash;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// A reference to a block with its essential identifying information.
///
/// Number `0` denotes the genesis block, which has no parent; its
/// `parent_hash` is the zero hash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    /// The block's hash.
    pub hash: B256,
    /// The block number.
    pub number: u64,
    /// The hash of the parent block.
    pub parent_hash: B256,
}

impl BlockInfo {
    /// Creates a new block reference.
    pub const fn new(hash: B256, number: u64, parent_hash: B256) -> Self {
        Self { hash, number, parent_hash }
    }

    /// Returns the block's number-and-hash identifier.
    pub const fn id(&self) -> BlockNumHash {
        BlockNumHash { number: self.number, hash: self.hash }
    }

    /// Returns `true` if `self` is the direct child of `parent`.
    pub fn is_child_of(&self, parent: &Self) -> bool {
        self.parent_hash == parent.hash && self.number == parent.number + 1
    }
}

impl core::fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.number, self.hash)
    }
}
