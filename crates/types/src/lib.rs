//! Core types shared across scout components.
//!
//! This crate defines the fundamental data structures used by the chain
//! event tracker: block references, chain logs, committed chain updates,
//! and the log filter specification.

mod block;
pub use block::BlockInfo;

mod log;
pub use log::Log;

mod update;
pub use update::ChainUpdate;

mod filter;
pub use filter::{FilterError, FilterSpec, TOPIC_SLOTS};
