//! Scripted chain double shared by the core test suites.
//!
//! `MockChain` plays the provider role with a mutable canonical chain:
//! scenarios append or overwrite blocks, forks are expressed by
//! re-adding a number with a different forged hash, and parent hashes
//! are wired to whatever the chain held at insertion time.

use crate::{ChainProvider, LogQuery, ProviderError};
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use parking_lot::Mutex;
use scout_types::{BlockInfo, Log};
use std::collections::HashMap;

/// Forges a deterministic hash out of a block number and a fork id.
pub(crate) fn forge_hash(number: u64, fork: u64) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&fork.to_be_bytes());
    bytes[24..].copy_from_slice(&number.to_be_bytes());
    B256::from(bytes)
}

/// Canonical header at `number` on fork 0.
pub(crate) fn header(number: u64) -> BlockInfo {
    header_on_fork(number, 0, 0)
}

/// Header at `number` on `fork`, with its parent forged on
/// `parent_fork`. Genesis carries the zero parent hash.
pub(crate) fn header_on_fork(number: u64, fork: u64, parent_fork: u64) -> BlockInfo {
    let parent_hash =
        if number == 0 { B256::ZERO } else { forge_hash(number - 1, parent_fork) };
    BlockInfo::new(forge_hash(number, fork), number, parent_hash)
}

/// Parent-linked fork-0 chain covering `from..=to`.
pub(crate) fn blocks(from: u64, to: u64) -> Vec<BlockInfo> {
    (from..=to).map(header).collect()
}

/// A log as the provider would serve it for `block`.
pub(crate) fn log_for(block: &BlockInfo, address: Address, data: u8, log_index: u32) -> Log {
    Log {
        block_hash: block.hash,
        block_number: block.number,
        address,
        topics: vec![],
        data: Bytes::from(vec![data]),
        log_index,
    }
}

/// A scripted block: a header plus the logs the provider serves for it.
#[derive(Debug, Clone)]
pub(crate) struct TestBlock {
    pub(crate) info: BlockInfo,
    pub(crate) logs: Vec<Log>,
}

impl TestBlock {
    pub(crate) const fn new(info: BlockInfo) -> Self {
        Self { info, logs: Vec::new() }
    }

    pub(crate) fn with_log(self, data: u8) -> Self {
        self.with_addressed_log(Address::ZERO, data)
    }

    pub(crate) fn with_addressed_log(mut self, address: Address, data: u8) -> Self {
        let log = log_for(&self.info, address, data, self.logs.len() as u32);
        self.logs.push(log);
        self
    }
}

#[derive(Debug, Default)]
struct Inner {
    head: u64,
    by_number: HashMap<u64, B256>,
    headers: HashMap<B256, BlockInfo>,
    logs: HashMap<B256, Vec<Log>>,
    /// Widest log range served before rejecting with `RangeTooLarge`.
    max_log_range: Option<u64>,
    range_queries: u32,
}

/// Scripted [`ChainProvider`] double with a mutable canonical chain.
#[derive(Debug, Default)]
pub(crate) struct MockChain {
    inner: Mutex<Inner>,
}

impl MockChain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Rejects log range queries wider than `max_range` blocks.
    pub(crate) fn reject_ranges_wider_than(&self, max_range: u64) {
        self.inner.lock().max_log_range = Some(max_range);
    }

    /// Number of range log queries served or rejected so far.
    pub(crate) fn range_queries(&self) -> u32 {
        self.inner.lock().range_queries
    }

    /// Moves the reported head without touching the chain.
    pub(crate) fn set_head(&self, head: u64) {
        self.inner.lock().head = head;
    }

    /// Applies a scenario: each block becomes canonical at its number,
    /// its parent hash rewired to the block currently canonical below
    /// it, and its logs replace whatever the block hash had before.
    pub(crate) fn add_scenario(&self, scenario: impl IntoIterator<Item = TestBlock>) {
        let mut inner = self.inner.lock();
        for mut block in scenario {
            if block.info.number > 0 {
                if let Some(parent_hash) = inner.by_number.get(&(block.info.number - 1)) {
                    block.info.parent_hash = *parent_hash;
                }
            }
            inner.head = inner.head.max(block.info.number);
            inner.by_number.insert(block.info.number, block.info.hash);
            inner.headers.insert(block.info.hash, block.info);
            inner.logs.insert(block.info.hash, block.logs);
        }
    }

    /// Inserts a block verbatim, without parent rewiring.
    pub(crate) fn add_block_raw(&self, block: TestBlock) {
        let mut inner = self.inner.lock();
        inner.head = inner.head.max(block.info.number);
        inner.by_number.insert(block.info.number, block.info.hash);
        inner.headers.insert(block.info.hash, block.info);
        inner.logs.insert(block.info.hash, block.logs);
    }

    /// The canonical suffix of at most `n` blocks, oldest first.
    pub(crate) fn last_blocks(&self, n: u64) -> Vec<BlockInfo> {
        let inner = self.inner.lock();
        let first = inner.head.saturating_sub(n - 1);
        (first..=inner.head)
            .filter_map(|number| {
                inner.by_number.get(&number).and_then(|hash| inner.headers.get(hash)).copied()
            })
            .collect()
    }

    /// All logs of the canonical chain, oldest block first.
    pub(crate) fn canonical_logs(&self) -> Vec<Log> {
        let inner = self.inner.lock();
        (0..=inner.head)
            .filter_map(|number| inner.by_number.get(&number))
            .filter_map(|hash| inner.logs.get(hash))
            .flatten()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ChainProvider for MockChain {
    async fn head_number(&self) -> Result<u64, ProviderError> {
        Ok(self.inner.lock().head)
    }

    async fn block_by_number(&self, number: u64) -> Result<BlockInfo, ProviderError> {
        let inner = self.inner.lock();
        inner
            .by_number
            .get(&number)
            .and_then(|hash| inner.headers.get(hash))
            .copied()
            .ok_or(ProviderError::NotFound)
    }

    async fn block_by_hash(&self, hash: B256) -> Result<BlockInfo, ProviderError> {
        self.inner.lock().headers.get(&hash).copied().ok_or(ProviderError::NotFound)
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>, ProviderError> {
        let mut inner = self.inner.lock();
        match query {
            LogQuery::Block(hash) => Ok(inner.logs.get(hash).cloned().unwrap_or_default()),
            LogQuery::Range { from, to, filter } => {
                inner.range_queries += 1;
                if *from > *to {
                    return Err(ProviderError::NotFound);
                }
                if let Some(max) = inner.max_log_range {
                    if to - from + 1 > max {
                        return Err(ProviderError::RangeTooLarge);
                    }
                }
                let mut out = Vec::new();
                for number in *from..=*to {
                    let hash =
                        inner.by_number.get(&number).ok_or(ProviderError::NotFound)?;
                    if let Some(logs) = inner.logs.get(hash) {
                        out.extend(logs.iter().filter(|log| filter.matches(log)).cloned());
                    }
                }
                Ok(out)
            }
        }
    }
}
