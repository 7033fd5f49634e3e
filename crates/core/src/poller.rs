use crate::ChainProvider;
use alloy_eips::BlockNumHash;
use scout_types::BlockInfo;
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Periodic head probe feeding the dispatcher's candidate queue.
///
/// Each tick asks the provider for its head number and, when the head
/// moved, submits the head block as a candidate. Missed ticks are
/// harmless; the next tick catches up. A head number that moved
/// backward is skipped as transient, it never triggers a reorg by
/// itself.
#[derive(Debug)]
pub struct HeadPoller<P> {
    provider: Arc<P>,
    poll_interval: Duration,
    candidate_tx: mpsc::Sender<BlockInfo>,
    cancellation: CancellationToken,
}

impl<P> HeadPoller<P>
where
    P: ChainProvider + 'static,
{
    /// Creates a new [`HeadPoller`].
    pub const fn new(
        provider: Arc<P>,
        poll_interval: Duration,
        candidate_tx: mpsc::Sender<BlockInfo>,
        cancellation: CancellationToken,
    ) -> Self {
        Self { provider, poll_interval, candidate_tx, cancellation }
    }

    /// Polls until cancelled or until the dispatcher goes away.
    pub async fn run(self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last_submitted: Option<BlockNumHash> = None;

        loop {
            tokio::select! {
                _ = self.cancellation.cancelled() => {
                    info!(target: "head_poller", "poller cancellation requested, stopping...");
                    break;
                }
                _ = interval.tick() => {
                    if !self.poll_once(&mut last_submitted).await {
                        break;
                    }
                }
            }
        }
    }

    /// One probe. Returns `false` once the candidate queue is closed.
    async fn poll_once(&self, last_submitted: &mut Option<BlockNumHash>) -> bool {
        let head = match self.provider.head_number().await {
            Ok(head) => head,
            Err(err) => {
                warn!(target: "head_poller", %err, "head probe failed");
                return true;
            }
        };
        if let Some(last) = last_submitted {
            if head < last.number {
                debug!(
                    target: "head_poller",
                    head,
                    last_number = last.number,
                    "head number moved backward, skipping tick"
                );
                return true;
            }
        }

        let block = match self.provider.block_by_number(head).await {
            Ok(block) => block,
            Err(err) => {
                warn!(target: "head_poller", %err, head, "head block fetch failed");
                return true;
            }
        };
        if last_submitted.is_some_and(|last| last == block.id()) {
            return true;
        }

        if self.candidate_tx.send(block).await.is_err() {
            info!(target: "head_poller", "candidate queue closed, stopping...");
            return false;
        }
        *last_submitted = Some(block.id());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{blocks, MockChain, TestBlock};
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn submits_new_heads_once_and_skips_regressions() {
        let chain = Arc::new(MockChain::new());
        chain.add_scenario(blocks(0, 6).into_iter().map(TestBlock::new));
        chain.set_head(5);

        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let poller =
            HeadPoller::new(chain.clone(), Duration::from_secs(5), tx, cancel.clone());
        let handle = tokio::spawn(poller.run());

        // First tick submits the head exactly once.
        let candidate = timeout(Duration::from_secs(60), rx.recv()).await.unwrap().unwrap();
        assert_eq!(candidate.number, 5);

        // Repeated and backward-moving heads submit nothing.
        tokio::time::sleep(Duration::from_secs(20)).await;
        chain.set_head(4);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(rx.try_recv().is_err());

        // A genuinely new head is submitted.
        chain.set_head(6);
        let candidate = timeout(Duration::from_secs(60), rx.recv()).await.unwrap().unwrap();
        assert_eq!(candidate.number, 6);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn transient_probe_failures_are_tolerated() {
        use crate::provider::{MockChainProvider, ProviderError};

        let mut provider = MockChainProvider::new();
        let mut seq = mockall::Sequence::new();
        provider
            .expect_head_number()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(ProviderError::Timeout));
        provider.expect_head_number().returning(|| Ok(3));
        provider
            .expect_block_by_number()
            .returning(|number| Ok(crate::test_utils::header(number)));

        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let poller = HeadPoller::new(
            Arc::new(provider),
            Duration::from_secs(5),
            tx,
            cancel.clone(),
        );
        let handle = tokio::spawn(poller.run());

        // The first probe fails; the next tick recovers.
        let candidate = timeout(Duration::from_secs(60), rx.recv()).await.unwrap().unwrap();
        assert_eq!(candidate.number, 3);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_the_dispatcher_goes_away() {
        let chain = Arc::new(MockChain::new());
        chain.add_scenario(blocks(0, 1).into_iter().map(TestBlock::new));

        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let poller =
            HeadPoller::new(chain, Duration::from_secs(5), tx, CancellationToken::new());

        // Exits on its own once the queue is closed.
        timeout(Duration::from_secs(60), poller.run()).await.unwrap();
    }
}
