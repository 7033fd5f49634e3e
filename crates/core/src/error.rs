use crate::{ProviderError, WindowError};
use alloy_primitives::B256;
use scout_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the tracker.
///
/// Transient variants are retried with backoff at the sync and polling
/// layers; fatal variants halt the tracker and close the update stream,
/// requiring operator intervention.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The provider returned chain data that does not cohere: a missing
    /// block mid-walk, a parent chain that cannot be followed, or a
    /// hash disagreement between query forms. Transient.
    #[error("provider returned inconsistent chain data: {0}")]
    ProviderInconsistent(String),

    /// The provider reports a different hash for a block older than the
    /// backlog window, which the tracker considers final. Fatal.
    #[error("provider rewrote finalized block {number}: stored {stored}, canonical {canonical}")]
    ProviderRewroteFinalized {
        /// Number of the disputed block.
        number: u64,
        /// Hash the tracker persisted.
        stored: B256,
        /// Hash the provider now reports.
        canonical: B256,
    },

    /// A reorg reaches below the oldest tracked block; the common
    /// ancestor is beyond the backlog policy. Fatal.
    #[error("reorg ancestor is older than the tracked backlog window")]
    AncestorBelowBacklog,

    /// The store failed; emission pauses until it recovers.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The window rejected a planned transition. Internal invariant
    /// breach between plan and apply.
    #[error(transparent)]
    Window(#[from] WindowError),

    /// The operation was cancelled; no state was corrupted.
    #[error("tracker cancelled")]
    Cancelled,
}

impl TrackerError {
    /// Returns `true` for errors that must halt the tracker.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ProviderRewroteFinalized { .. } | Self::AncestorBelowBacklog | Self::Window(_)
        )
    }
}

impl From<ProviderError> for TrackerError {
    fn from(err: ProviderError) -> Self {
        Self::ProviderInconsistent(err.to_string())
    }
}
