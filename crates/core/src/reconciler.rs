use crate::{BlockWindow, ChainProvider, LogQuery, TrackerError};
use derive_more::Constructor;
use scout_storage::LogStorageReader;
use scout_types::{BlockInfo, ChainUpdate, FilterSpec, Log};

/// Turns a candidate head into the minimal [`ChainUpdate`] that extends
/// the window to terminate at it.
///
/// The reconciler is deliberately side-effect-free: it reads the window
/// and the store, queries the provider, and returns a plan. Applying
/// the plan atomically is the dispatcher's job, so tests can drive this
/// type with scripted providers and inspect the plan before any state
/// mutation.
#[derive(Debug, Constructor)]
pub struct Reconciler<'a, P, S> {
    provider: &'a P,
    store: &'a S,
    window: &'a BlockWindow,
    filter: &'a FilterSpec,
}

impl<P, S> Reconciler<'_, P, S>
where
    P: ChainProvider,
    S: LogStorageReader,
{
    /// Computes the update that reconciles the window with `candidate`.
    ///
    /// Returns an empty update for duplicate or already-known
    /// candidates. Rollbacks list removed blocks newest first; added
    /// blocks are listed oldest first, each carrying its filtered logs
    /// in provider order.
    pub async fn reconcile(&self, candidate: BlockInfo) -> Result<ChainUpdate, TrackerError> {
        let Some(cursor) = self.window.cursor().copied() else {
            // Empty window: the candidate bootstraps the chain.
            return self.assemble(vec![candidate], Vec::new()).await;
        };

        if candidate.hash == cursor.hash {
            return Ok(ChainUpdate::default());
        }
        if candidate.number <= cursor.number && self.window.find_by_hash(candidate.hash).is_some() {
            // Stale announcement of a block we already track.
            return Ok(ChainUpdate::default());
        }

        let proposed = if candidate.is_child_of(&cursor) {
            vec![candidate]
        } else if candidate.number > cursor.number + 1 {
            self.walk_forward(&cursor, candidate).await?
        } else {
            vec![candidate]
        };

        match proposed.first() {
            Some(first) if first.is_child_of(&cursor) => self.assemble(proposed, Vec::new()).await,
            Some(_) => {
                let (proposed, removed) = self.walk_back(proposed).await?;
                self.assemble(proposed, removed).await
            }
            None => Ok(ChainUpdate::default()),
        }
    }

    /// Fetches the canonical headers between the cursor and `candidate`
    /// and returns the parent-linked chain ending at `candidate`.
    async fn walk_forward(
        &self,
        cursor: &BlockInfo,
        candidate: BlockInfo,
    ) -> Result<Vec<BlockInfo>, TrackerError> {
        let mut chain = Vec::with_capacity((candidate.number - cursor.number) as usize);
        for number in cursor.number + 1..candidate.number {
            let header = self.provider.block_by_number(number).await?;
            if let Some(previous) = chain.last() {
                if !header.is_child_of(previous) {
                    return Err(TrackerError::ProviderInconsistent(format!(
                        "canonical chain does not parent-link at block {number}"
                    )));
                }
            }
            chain.push(header);
        }
        if let Some(last) = chain.last() {
            if !candidate.is_child_of(last) {
                return Err(TrackerError::ProviderInconsistent(format!(
                    "candidate {candidate} does not attach to canonical block {last}"
                )));
            }
        }
        chain.push(candidate);
        Ok(chain)
    }

    /// Walks the proposed chain backward until it attaches to a window
    /// entry, returning the extended chain and the window suffix to
    /// roll back, newest first.
    async fn walk_back(
        &self,
        mut proposed: Vec<BlockInfo>,
    ) -> Result<(Vec<BlockInfo>, Vec<BlockInfo>), TrackerError> {
        loop {
            // `proposed` is non-empty by construction.
            let Some(first) = proposed.first().copied() else {
                return Err(TrackerError::ProviderInconsistent("empty proposed chain".into()));
            };
            let Some(number) = first.number.checked_sub(1) else {
                // The fork reaches below genesis.
                return Err(TrackerError::AncestorBelowBacklog);
            };

            let canonical = self.provider.block_by_number(number).await?;
            if first.parent_hash != canonical.hash {
                return Err(TrackerError::ProviderInconsistent(format!(
                    "canonical chain does not parent-link at block {number}"
                )));
            }

            match self.window.get_by_number(number) {
                Some(local) if local.hash == canonical.hash => {
                    // Common ancestor found inside the window.
                    let removed = self.removed_above(number);
                    return Ok((proposed, removed));
                }
                Some(_) => proposed.insert(0, canonical),
                None => {
                    // Below the window. The sole tolerated case is the
                    // evicted parent of the oldest entry, a reorg of
                    // exactly the full backlog.
                    let oldest = self.window.oldest().copied().unwrap_or_default();
                    if number + 1 == oldest.number && canonical.hash == oldest.parent_hash {
                        let removed = self.removed_above(number);
                        return Ok((proposed, removed));
                    }
                    return Err(TrackerError::AncestorBelowBacklog);
                }
            }
        }
    }

    /// Window entries newer than `number`, newest first.
    fn removed_above(&self, number: u64) -> Vec<BlockInfo> {
        self.window
            .snapshot()
            .into_iter()
            .rev()
            .take_while(|block| block.number > number)
            .collect()
    }

    /// Assembles the final update, fetching added logs from the
    /// provider per block hash and removed logs from the local store.
    async fn assemble(
        &self,
        added: Vec<BlockInfo>,
        removed: Vec<BlockInfo>,
    ) -> Result<ChainUpdate, TrackerError> {
        let mut added_logs = Vec::new();
        for block in &added {
            let logs = self.provider.logs(&LogQuery::Block(block.hash)).await?;
            added_logs.extend(logs.into_iter().filter(|log| self.filter.matches(log)));
        }

        // The fork is gone from the provider's view; removed logs are
        // read back from the store.
        let mut removed_logs: Vec<Log> = Vec::new();
        for block in &removed {
            removed_logs.extend(self.store.logs_by_block_hash(block.hash)?);
        }

        Ok(ChainUpdate { added, removed, added_logs, removed_logs })
    }
}
