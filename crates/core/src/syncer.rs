//! Bulk synchronization: cold-start bootstrap and catch-up.
//!
//! Catch-up uses range log queries bounded by the configured batch
//! size, halving on provider rejection down to a floor of one block.
//! A mid-range parent-link or log-hash mismatch means the range crossed
//! a reorg boundary; the range is abandoned and the provider head is
//! reconciled through the single-step path instead.

use crate::{BlockWindow, ChainProvider, LogQuery, Metrics, ProviderError, Tracker, TrackerError};
use scout_storage::TrackerStorage;
use scout_types::ChainUpdate;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

enum RangeOutcome {
    /// The range was admitted and committed as one update.
    Applied,
    /// The provider rejected the range as too wide.
    Rejected,
    /// The range crossed a reorg boundary and was abandoned.
    Diverged,
}

impl<P, S> Tracker<P, S>
where
    P: ChainProvider + 'static,
    S: TrackerStorage + 'static,
{
    /// Brings the local window up to the provider's current head.
    ///
    /// Resumes from the persisted window when one exists, preflights it
    /// against the provider, then catches up in bulk ranges. May commit
    /// and publish many updates. Transient failures are retried with
    /// exponential backoff up to the configured bound; fatal failures
    /// and cancellation surface immediately.
    pub async fn sync(&mut self, cancel: &CancellationToken) -> Result<(), TrackerError> {
        self.restore_window()?;
        self.pre_sync_check(cancel).await?;
        self.catch_up(cancel).await
    }

    /// Rebuilds the in-memory window from the persisted snapshot.
    fn restore_window(&mut self) -> Result<(), TrackerError> {
        if !self.window.is_empty() {
            return Ok(());
        }
        let Some(snapshot) = self.store.load_window()? else {
            return Ok(());
        };
        let Some(cursor) = snapshot.last().copied() else {
            return Ok(());
        };
        self.window = BlockWindow::restore(self.config.max_backlog as usize, snapshot)?;
        info!(
            target: "syncer",
            cursor_number = cursor.number,
            "resuming from persisted window"
        );
        Ok(())
    }

    /// Rejects a provider that silently rewrote a block the tracker
    /// considers final. A disagreement within the backlog falls through
    /// to normal fork handling.
    async fn pre_sync_check(&self, cancel: &CancellationToken) -> Result<(), TrackerError> {
        let Some(cursor) = self.window.cursor().copied() else {
            return Ok(());
        };
        if cancel.is_cancelled() {
            return Err(TrackerError::Cancelled);
        }
        let head = self.provider.head_number().await?;
        let canonical = self.provider.block_by_number(cursor.number).await?;
        if canonical.hash != cursor.hash
            && cursor.number < head.saturating_sub(self.config.max_backlog)
        {
            return Err(TrackerError::ProviderRewroteFinalized {
                number: cursor.number,
                stored: cursor.hash,
                canonical: canonical.hash,
            });
        }
        Ok(())
    }

    async fn catch_up(&mut self, cancel: &CancellationToken) -> Result<(), TrackerError> {
        let mut attempts = 0u32;
        let mut backoff = self.config.initial_backoff;
        loop {
            if cancel.is_cancelled() {
                return Err(TrackerError::Cancelled);
            }
            match self.advance_once(cancel).await {
                Ok(true) => return Ok(()),
                Ok(false) => {
                    attempts = 0;
                    backoff = self.config.initial_backoff;
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(TrackerError::Cancelled) => return Err(TrackerError::Cancelled),
                Err(err) => {
                    attempts += 1;
                    if attempts > self.config.max_retries {
                        return Err(err);
                    }
                    warn!(target: "syncer", %err, attempts, "transient sync failure, backing off");
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(TrackerError::Cancelled),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(self.config.max_backoff);
                }
            }
        }
    }

    /// One catch-up pass. Returns `true` once the window terminates at
    /// the provider's head.
    async fn advance_once(&mut self, cancel: &CancellationToken) -> Result<bool, TrackerError> {
        let head = self.provider.head_number().await?;
        let from = match self.window.cursor().copied() {
            Some(cursor) if head <= cursor.number => {
                // Caught up, or the provider disagrees at or below our
                // height. A backward-moving head alone never triggers a
                // reorg; only hash evidence does.
                let canonical = self.provider.block_by_number(head).await?;
                if self.window.find_by_hash(canonical.hash).is_some() {
                    return Ok(true);
                }
                self.handle_candidate(canonical).await?;
                return Ok(false);
            }
            Some(cursor) => cursor.number + 1,
            None => {
                let start = self
                    .config
                    .start_block
                    .unwrap_or_else(|| head.saturating_sub(self.config.max_backlog - 1));
                if start > head {
                    debug!(target: "syncer", start, head, "start block beyond head, nothing to sync");
                    return Ok(true);
                }
                info!(target: "syncer", start, head, "bootstrapping empty window");
                start
            }
        };
        self.sync_ranges(from, head, cancel).await?;
        Ok(false)
    }

    async fn sync_ranges(
        &mut self,
        mut from: u64,
        head: u64,
        cancel: &CancellationToken,
    ) -> Result<(), TrackerError> {
        let mut batch = self.config.batch_size.max(1);
        while from <= head {
            if cancel.is_cancelled() {
                return Err(TrackerError::Cancelled);
            }
            let to = from.saturating_add(batch - 1).min(head);
            match self.sync_range(from, to, cancel).await? {
                RangeOutcome::Applied => {
                    Metrics::record_sync_batch();
                    from = to + 1;
                    batch = self.config.batch_size.max(1);
                }
                RangeOutcome::Rejected => {
                    if batch == 1 {
                        return Err(TrackerError::ProviderInconsistent(
                            "provider rejected a single-block log range".into(),
                        ));
                    }
                    batch /= 2;
                    debug!(target: "syncer", batch, "provider rejected log range, halving batch");
                }
                RangeOutcome::Diverged => {
                    // The provider's chain moved under us; reconcile its
                    // head through the single-step path instead.
                    let candidate = self.provider.block_by_number(head).await?;
                    self.handle_candidate(candidate).await?;
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Admits the blocks of `[from, to]` as one grouped update.
    async fn sync_range(
        &mut self,
        from: u64,
        to: u64,
        cancel: &CancellationToken,
    ) -> Result<RangeOutcome, TrackerError> {
        let query = LogQuery::Range { from, to, filter: self.config.filter.clone() };
        let logs = match self.provider.logs(&query).await {
            Ok(logs) => logs,
            Err(ProviderError::RangeTooLarge) => return Ok(RangeOutcome::Rejected),
            Err(err) => return Err(err.into()),
        };

        let mut headers = Vec::with_capacity((to - from + 1) as usize);
        for number in from..=to {
            if cancel.is_cancelled() {
                return Err(TrackerError::Cancelled);
            }
            let header = self.provider.block_by_number(number).await?;
            if let Some(previous) = headers.last().or_else(|| self.window.cursor()) {
                if !header.is_child_of(previous) {
                    debug!(
                        target: "syncer",
                        block_number = number,
                        "range does not parent-link, abandoning"
                    );
                    return Ok(RangeOutcome::Diverged);
                }
            }
            headers.push(header);
        }

        // Partition the range logs by admitted block, cross-checking
        // each log's block hash against the fetched header.
        let mut added_logs = Vec::with_capacity(logs.len());
        for header in &headers {
            for log in logs.iter().filter(|log| log.block_number == header.number) {
                if log.block_hash != header.hash {
                    debug!(
                        target: "syncer",
                        block_number = header.number,
                        "log range crossed a fork, abandoning"
                    );
                    return Ok(RangeOutcome::Diverged);
                }
                if self.config.filter.matches(log) {
                    added_logs.push(log.clone());
                }
            }
        }

        let update = ChainUpdate {
            added: headers,
            removed: Vec::new(),
            added_logs,
            removed_logs: Vec::new(),
        };
        self.commit(update).await?;
        Ok(RangeOutcome::Applied)
    }
}
