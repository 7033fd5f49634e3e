use crate::StorageError;
use alloy_primitives::B256;
use scout_types::{BlockInfo, Log};
use std::fmt::Debug;

/// Read access to the persisted block window.
///
/// Implementations are expected to provide thread-safe access.
pub trait HeadStorageReader {
    /// Loads the persisted window snapshot, oldest block first.
    ///
    /// # Returns
    /// * `Ok(Some(window))` if a snapshot was previously saved.
    /// * `Ok(None)` if the store has never been written.
    /// * `Err(StorageError)` if there is an issue reading the snapshot.
    fn load_window(&self) -> Result<Option<Vec<BlockInfo>>, StorageError>;
}

/// Write access to the persisted block window.
pub trait HeadStorageWriter {
    /// Atomically replaces the window snapshot.
    ///
    /// The snapshot is ordered oldest first; its last entry is the
    /// cursor the tracker resumes from after a restart.
    fn save_window(&self, window: &[BlockInfo]) -> Result<(), StorageError>;
}

/// Read access to the committed log stream.
pub trait LogStorageReader {
    /// Returns all stored logs belonging to `block_hash`, in stored
    /// order.
    fn logs_by_block_hash(&self, block_hash: B256) -> Result<Vec<Log>, StorageError>;

    /// Returns all stored logs with block numbers in `[from, to]`, in
    /// stored order.
    fn range_logs(&self, from: u64, to: u64) -> Result<Vec<Log>, StorageError>;
}

/// Write access to the committed log stream.
///
/// The stream is append-only under normal operation; reorgs truncate
/// its tail by block-hash set.
pub trait LogStorageWriter {
    /// Appends `logs` to the stream, preserving order. Durable on
    /// return.
    fn append_logs(&self, logs: Vec<Log>) -> Result<(), StorageError>;

    /// Removes every stored log whose block hash is in `block_hashes`.
    fn remove_logs_by_block_hashes(&self, block_hashes: &[B256]) -> Result<(), StorageError>;
}

/// Composite capability for any backend that provides the full store
/// contract the tracker writes through:
/// - Window snapshot access (`HeadStorageReader` + `HeadStorageWriter`)
/// - Log stream access (`LogStorageReader` + `LogStorageWriter`)
pub trait TrackerStorage:
    HeadStorageReader + HeadStorageWriter + LogStorageReader + LogStorageWriter + Debug + Send + Sync
{
}

impl<T> TrackerStorage for T where
    T: HeadStorageReader
        + HeadStorageWriter
        + LogStorageReader
        + LogStorageWriter
        + Debug
        + Send
        + Sync
{
}
