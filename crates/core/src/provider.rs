use alloy_primitives::B256;
use async_trait::async_trait;
use scout_types::{BlockInfo, FilterSpec, Log};
use std::fmt::Debug;
use thiserror::Error;

/// A dynamic error type for encapsulating transport-level failures.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by a [`ChainProvider`] backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested block does not exist on the provider's canonical
    /// chain.
    #[error("block not found")]
    NotFound,

    /// The provider rejected a log range query as too wide.
    #[error("log range too large")]
    RangeTooLarge,

    /// The call exceeded the configured per-call timeout.
    #[error("provider call timed out")]
    Timeout,

    /// The underlying transport failed.
    #[error("transport failure")]
    Transport(#[source] TransportError),
}

impl ProviderError {
    /// Returns `true` when retrying the same call may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transport(_))
    }
}

/// The two query forms served by [`ChainProvider::logs`].
///
/// Range queries are reserved for bulk catch-up: they can cross a reorg
/// boundary mid-range, which the syncer detects and recovers from. In
/// steady state logs are always fetched by block hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogQuery {
    /// All logs of the block with the given hash.
    Block(B256),
    /// Logs with block numbers in the inclusive range, matching the
    /// filter.
    Range {
        /// First block number of the range.
        from: u64,
        /// Last block number of the range.
        to: u64,
        /// Server-side filter applied to the range.
        filter: FilterSpec,
    },
}

/// Remote chain queries the tracker depends on.
///
/// The provider is stateless from the tracker's view and may be shared
/// across tasks. Implementations must be thread-safe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainProvider: Debug + Send + Sync {
    /// Returns the provider's current best-known head number.
    async fn head_number(&self) -> Result<u64, ProviderError>;

    /// Returns the canonical header at `number`.
    async fn block_by_number(&self, number: u64) -> Result<BlockInfo, ProviderError>;

    /// Returns the header with the given hash.
    async fn block_by_hash(&self, hash: B256) -> Result<BlockInfo, ProviderError>;

    /// Returns the logs selected by `query`, in the provider's order.
    async fn logs(&self, query: &LogQuery) -> Result<Vec<Log>, ProviderError>;
}
