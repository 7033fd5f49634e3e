//! Storage capabilities for the scout tracker.
//!
//! The tracker persists two things: a snapshot of the canonical block
//! window and an append-only stream of committed logs. This crate
//! defines the capability traits the tracker writes through and ships
//! the in-memory backend used for embedding and tests. Disk backends
//! implement the same traits.

mod error;
pub use error::{SourceError, StorageError};

mod traits;
pub use traits::{
    HeadStorageReader, HeadStorageWriter, LogStorageReader, LogStorageWriter, TrackerStorage,
};

mod mem;
pub use mem::InMemoryStore;
