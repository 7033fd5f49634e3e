use scout_types::FilterSpec;
use std::time::Duration;

/// Tracker configuration.
///
/// `max_backlog` bounds both the window depth and the deepest reorg the
/// tracker will absorb; it should be at least the chain's expected
/// finality depth.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum window depth, and therefore the deepest tolerated reorg.
    pub max_backlog: u64,
    /// Initial bulk-sync range width. Halved down to 1 when the
    /// provider rejects a range, restored after the range succeeds.
    pub batch_size: u64,
    /// Head-poll cadence.
    pub poll_interval: Duration,
    /// Bootstrap start override, used only when the store is empty.
    pub start_block: Option<u64>,
    /// Log matcher applied at ingestion, before admission to the store.
    pub filter: FilterSpec,
    /// Bounded retries for transient provider failures.
    pub max_retries: u32,
    /// First retry delay; doubled per attempt up to `max_backoff`.
    pub initial_backoff: Duration,
    /// Retry delay ceiling.
    pub max_backoff: Duration,
    /// Capacity of each subscriber channel; a full channel back-
    /// pressures the dispatcher.
    pub subscriber_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_backlog: 10,
            batch_size: 1000,
            poll_interval: Duration::from_secs(5),
            start_block: None,
            filter: FilterSpec::default(),
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            subscriber_buffer: 1024,
        }
    }
}

impl Config {
    /// Sets the maximum window depth.
    pub const fn with_max_backlog(mut self, max_backlog: u64) -> Self {
        self.max_backlog = max_backlog;
        self
    }

    /// Sets the initial bulk-sync range width.
    pub const fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the head-poll cadence.
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Overrides the bootstrap start block.
    pub const fn with_start_block(mut self, start_block: u64) -> Self {
        self.start_block = Some(start_block);
        self
    }

    /// Sets the ingestion filter.
    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }
}
