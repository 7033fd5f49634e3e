use scout_types::ChainUpdate;

#[derive(Debug, Clone)]
pub(crate) struct Metrics;

impl Metrics {
    pub(crate) const TRACKER_UPDATES_TOTAL: &'static str = "scout_tracker_updates_total";
    pub(crate) const TRACKER_REORG_DEPTH: &'static str = "scout_tracker_reorg_depth";
    pub(crate) const TRACKER_RECONCILE_ERRORS_TOTAL: &'static str =
        "scout_tracker_reconcile_errors_total";
    pub(crate) const TRACKER_SYNC_BATCHES_TOTAL: &'static str = "scout_tracker_sync_batches_total";
    pub(crate) const TRACKER_CURSOR_NUMBER: &'static str = "scout_tracker_cursor_number";

    pub(crate) fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::TRACKER_UPDATES_TOTAL,
            metrics::Unit::Count,
            "Total number of chain updates committed and published by the tracker",
        );

        metrics::describe_histogram!(
            Self::TRACKER_REORG_DEPTH,
            metrics::Unit::Count,
            "Number of blocks rolled back per reorganization",
        );

        metrics::describe_counter!(
            Self::TRACKER_RECONCILE_ERRORS_TOTAL,
            metrics::Unit::Count,
            "Total number of failed reconcile attempts",
        );

        metrics::describe_counter!(
            Self::TRACKER_SYNC_BATCHES_TOTAL,
            metrics::Unit::Count,
            "Total number of bulk sync ranges applied",
        );

        metrics::describe_gauge!(
            Self::TRACKER_CURSOR_NUMBER,
            metrics::Unit::Count,
            "Block number of the tracker cursor",
        );
    }

    fn zero() {
        metrics::counter!(Self::TRACKER_UPDATES_TOTAL).increment(0);
        metrics::histogram!(Self::TRACKER_REORG_DEPTH).record(0.0);
        metrics::counter!(Self::TRACKER_RECONCILE_ERRORS_TOTAL).increment(0);
        metrics::counter!(Self::TRACKER_SYNC_BATCHES_TOTAL).increment(0);
        metrics::gauge!(Self::TRACKER_CURSOR_NUMBER).set(0.0);
    }

    pub(crate) fn record_update(update: &ChainUpdate, cursor_number: u64) {
        metrics::counter!(Self::TRACKER_UPDATES_TOTAL).increment(1);
        if update.is_reorg() {
            metrics::histogram!(Self::TRACKER_REORG_DEPTH).record(update.removed.len() as f64);
        }
        metrics::gauge!(Self::TRACKER_CURSOR_NUMBER).set(cursor_number as f64);
    }

    pub(crate) fn record_reconcile_error() {
        metrics::counter!(Self::TRACKER_RECONCILE_ERRORS_TOTAL).increment(1);
    }

    pub(crate) fn record_sync_batch() {
        metrics::counter!(Self::TRACKER_SYNC_BATCHES_TOTAL).increment(1);
    }
}
