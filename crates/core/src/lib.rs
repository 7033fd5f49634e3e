//! Core logic for the scout chain event tracker.
//!
//! The tracker follows the head of a remote node through the
//! [`ChainProvider`] capability, reconciles candidate heads against a
//! bounded [`BlockWindow`] of recent canonical headers, and publishes
//! ordered [`ChainUpdate`](scout_types::ChainUpdate)s whose effects are
//! persisted through the storage capability before emission.
//!
//! Mutation is single-writer: the [`Tracker`] owns the window and the
//! store-write side, consuming candidate heads from the [`HeadPoller`]
//! (steady state) and from its own bulk sync path (catch-up).

mod config;
pub use config::Config;

mod error;
pub use error::TrackerError;

mod provider;
pub use provider::{ChainProvider, LogQuery, ProviderError, TransportError};

mod window;
pub use window::{BlockWindow, WindowError};

mod reconciler;
pub use reconciler::Reconciler;

mod syncer;

mod tracker;
pub use tracker::Tracker;

mod poller;
pub use poller::HeadPoller;

mod metrics;
pub(crate) use self::metrics::Metrics;

#[cfg(test)]
pub(crate) mod test_utils;
