use crate::{BlockWindow, ChainProvider, Config, HeadPoller, Metrics, Reconciler, TrackerError};
use alloy_primitives::B256;
use scout_storage::{StorageError, TrackerStorage};
use scout_types::{BlockInfo, ChainUpdate};
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Depth of the candidate queue feeding the dispatcher. Candidates
/// arriving while a reconcile is in flight accumulate here; they are
/// never interleaved.
pub(crate) const CANDIDATE_QUEUE_DEPTH: usize = 64;

/// The single-writer dispatcher.
///
/// The tracker exclusively owns the [`BlockWindow`] and the store-write
/// capability; every mutation flows through it. Candidate heads from
/// the poller and from bulk sync are serialized, reconciled into a
/// [`ChainUpdate`] plan, applied to the window, persisted, and only
/// then published to subscribers.
#[derive(Debug)]
pub struct Tracker<P, S> {
    pub(crate) provider: Arc<P>,
    pub(crate) store: Arc<S>,
    pub(crate) config: Config,
    pub(crate) window: BlockWindow,
    update_txs: Vec<mpsc::Sender<Arc<ChainUpdate>>>,
}

impl<P, S> Tracker<P, S>
where
    P: ChainProvider + 'static,
    S: TrackerStorage + 'static,
{
    /// Creates a tracker over the given capabilities.
    pub fn new(provider: Arc<P>, store: Arc<S>, config: Config) -> Self {
        let window = BlockWindow::new(config.max_backlog as usize);
        Self { provider, store, config, window, update_txs: Vec::new() }
    }

    /// Registers a subscriber and returns its update receiver.
    ///
    /// Publication awaits every subscriber; a full channel back-
    /// pressures the dispatcher, which in turn pauses consumption of
    /// new candidates. Dropped receivers are pruned on the next
    /// publish. When the tracker halts, the channel closes.
    pub fn subscribe(&mut self) -> mpsc::Receiver<Arc<ChainUpdate>> {
        let (tx, rx) = mpsc::channel(self.config.subscriber_buffer);
        self.update_txs.push(tx);
        rx
    }

    /// The newest tracked block.
    pub fn cursor(&self) -> Option<BlockInfo> {
        self.window.cursor().copied()
    }

    /// The current canonical window.
    pub const fn window(&self) -> &BlockWindow {
        &self.window
    }

    /// Reconciles one candidate head and commits the resulting plan.
    ///
    /// Empty plans (duplicate or already-known candidates) commit
    /// nothing and publish nothing.
    pub async fn handle_candidate(&mut self, candidate: BlockInfo) -> Result<(), TrackerError> {
        let plan =
            Reconciler::new(&*self.provider, &*self.store, &self.window, &self.config.filter)
                .reconcile(candidate)
                .await?;
        if plan.is_empty() {
            debug!(target: "tracker", block_number = candidate.number, "candidate already tracked");
            return Ok(());
        }
        self.commit(plan).await
    }

    /// Applies a reconcile plan transactionally: window first, then the
    /// store in remove-logs, append-logs, save-window order, then
    /// publication.
    ///
    /// A storage failure rolls the window back to its persisted state
    /// so a retry replans from what the store actually holds.
    pub(crate) async fn commit(&mut self, update: ChainUpdate) -> Result<(), TrackerError> {
        for removed in &update.removed {
            let popped = self.window.pop_back()?;
            debug_assert_eq!(popped.hash, removed.hash, "plan diverged from window");
        }
        for added in &update.added {
            self.window.append(*added)?;
        }

        if let Err(err) = self.persist(&update) {
            for _ in &update.added {
                self.window.pop_back()?;
            }
            for removed in update.removed.iter().rev() {
                self.window.append(*removed)?;
            }
            warn!(target: "tracker", %err, "store write failed, update not committed");
            return Err(err.into());
        }

        let cursor_number = self.window.cursor().map(|block| block.number).unwrap_or_default();
        Metrics::record_update(&update, cursor_number);
        if update.is_reorg() {
            info!(
                target: "tracker",
                depth = update.removed.len(),
                added = update.added.len(),
                cursor_number,
                "committed reorganization"
            );
        } else {
            debug!(
                target: "tracker",
                added = update.added.len(),
                cursor_number,
                "committed chain extension"
            );
        }

        self.publish(update).await;
        Ok(())
    }

    fn persist(&self, update: &ChainUpdate) -> Result<(), StorageError> {
        if !update.removed.is_empty() {
            let removed_hashes: Vec<B256> =
                update.removed.iter().map(|block| block.hash).collect();
            self.store.remove_logs_by_block_hashes(&removed_hashes)?;
        }
        if !update.added_logs.is_empty() {
            self.store.append_logs(update.added_logs.clone())?;
        }
        self.store.save_window(&self.window.snapshot())
    }

    async fn publish(&mut self, update: ChainUpdate) {
        let update = Arc::new(update);
        let mut open = Vec::with_capacity(self.update_txs.len());
        for tx in self.update_txs.drain(..) {
            match tx.send(update.clone()).await {
                Ok(()) => open.push(tx),
                Err(_) => debug!(target: "tracker", "subscriber dropped, pruning"),
            }
        }
        self.update_txs = open;
    }

    /// Runs the dispatcher loop: an initial sync, then serialized
    /// reconciliation of queued candidate heads until cancellation.
    ///
    /// Transient failures are logged and retried on the next candidate;
    /// fatal failures cancel the token (stopping the poller), close the
    /// update stream and surface the error to the owning process.
    pub async fn run(
        mut self,
        mut candidate_rx: mpsc::Receiver<BlockInfo>,
        cancel: CancellationToken,
    ) -> Result<(), TrackerError> {
        match self.sync(&cancel).await {
            Ok(()) => {}
            Err(TrackerError::Cancelled) => return Ok(()),
            Err(err) if err.is_fatal() => {
                error!(target: "tracker", %err, "fatal failure during sync, halting");
                cancel.cancel();
                return Err(err);
            }
            Err(err) => {
                warn!(target: "tracker", %err, "initial sync incomplete, polling will catch up");
            }
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(target: "tracker", "tracker cancellation requested, stopping...");
                    return Ok(());
                }
                maybe_candidate = candidate_rx.recv() => {
                    let Some(candidate) = maybe_candidate else {
                        info!(target: "tracker", "candidate queue closed, stopping...");
                        return Ok(());
                    };
                    match self.handle_candidate(candidate).await {
                        Ok(()) => {}
                        Err(TrackerError::Cancelled) => return Ok(()),
                        Err(err) if err.is_fatal() => {
                            error!(target: "tracker", %err, "fatal tracker failure, halting");
                            cancel.cancel();
                            return Err(err);
                        }
                        Err(err) => {
                            Metrics::record_reconcile_error();
                            warn!(
                                target: "tracker",
                                %err,
                                block_number = candidate.number,
                                "reconcile failed, will retry on a future head"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Spawns the dispatcher together with its head poller.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<Result<(), TrackerError>> {
        Metrics::init();
        let (candidate_tx, candidate_rx) = mpsc::channel(CANDIDATE_QUEUE_DEPTH);
        let poller = HeadPoller::new(
            self.provider.clone(),
            self.config.poll_interval,
            candidate_tx,
            cancel.clone(),
        );
        tokio::spawn(async move {
            let poller_task = tokio::spawn(poller.run());
            let result = self.run(candidate_rx, cancel).await;
            let _ = poller_task.await;
            result
        })
    }
}
