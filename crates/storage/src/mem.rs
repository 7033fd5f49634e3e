use crate::{
    HeadStorageReader, HeadStorageWriter, LogStorageReader, LogStorageWriter, StorageError,
};
use alloy_primitives::B256;
use scout_types::{BlockInfo, Log};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Inner {
    window: Option<Vec<BlockInfo>>,
    logs: Vec<Log>,
}

/// In-memory store backend.
///
/// Keeps the window snapshot and the log stream behind a single mutex.
/// This is the default backend for embedding and the test double for
/// the scenario suites; durability is process-lifetime only.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the full log stream, in stored order.
    pub fn all_logs(&self) -> Vec<Log> {
        self.inner.lock().logs.clone()
    }

    /// Returns the number of stored logs.
    pub fn log_count(&self) -> usize {
        self.inner.lock().logs.len()
    }
}

impl HeadStorageReader for InMemoryStore {
    fn load_window(&self) -> Result<Option<Vec<BlockInfo>>, StorageError> {
        Ok(self.inner.lock().window.clone())
    }
}

impl HeadStorageWriter for InMemoryStore {
    fn save_window(&self, window: &[BlockInfo]) -> Result<(), StorageError> {
        self.inner.lock().window = Some(window.to_vec());
        Ok(())
    }
}

impl LogStorageReader for InMemoryStore {
    fn logs_by_block_hash(&self, block_hash: B256) -> Result<Vec<Log>, StorageError> {
        let inner = self.inner.lock();
        Ok(inner.logs.iter().filter(|log| log.block_hash == block_hash).cloned().collect())
    }

    fn range_logs(&self, from: u64, to: u64) -> Result<Vec<Log>, StorageError> {
        let inner = self.inner.lock();
        Ok(inner
            .logs
            .iter()
            .filter(|log| log.block_number >= from && log.block_number <= to)
            .cloned()
            .collect())
    }
}

impl LogStorageWriter for InMemoryStore {
    fn append_logs(&self, logs: Vec<Log>) -> Result<(), StorageError> {
        self.inner.lock().logs.extend(logs);
        Ok(())
    }

    fn remove_logs_by_block_hashes(&self, block_hashes: &[B256]) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        inner.logs.retain(|log| !block_hashes.contains(&log.block_hash));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes};

    fn log(block_number: u64, block_hash: B256, log_index: u32) -> Log {
        Log {
            block_hash,
            block_number,
            address: Address::ZERO,
            topics: vec![],
            data: Bytes::from(vec![log_index as u8]),
            log_index,
        }
    }

    #[test]
    fn append_preserves_order() {
        let store = InMemoryStore::new();
        let hash = B256::repeat_byte(0x01);
        store.append_logs(vec![log(1, hash, 0), log(1, hash, 1)]).unwrap();
        store.append_logs(vec![log(2, B256::repeat_byte(0x02), 0)]).unwrap();

        let indices: Vec<_> =
            store.all_logs().iter().map(|l| (l.block_number, l.log_index)).collect();
        assert_eq!(indices, vec![(1, 0), (1, 1), (2, 0)]);
    }

    #[test]
    fn remove_by_block_hash_set_truncates_only_those_blocks() {
        let store = InMemoryStore::new();
        let keep = B256::repeat_byte(0x01);
        let drop_a = B256::repeat_byte(0x02);
        let drop_b = B256::repeat_byte(0x03);
        store
            .append_logs(vec![log(1, keep, 0), log(2, drop_a, 0), log(3, drop_b, 0)])
            .unwrap();

        store.remove_logs_by_block_hashes(&[drop_a, drop_b]).unwrap();

        let remaining = store.all_logs();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].block_hash, keep);
    }

    #[test]
    fn range_read_is_inclusive() {
        let store = InMemoryStore::new();
        for number in 1..=5 {
            store.append_logs(vec![log(number, B256::repeat_byte(number as u8), 0)]).unwrap();
        }
        let logs = store.range_logs(2, 4).unwrap();
        assert_eq!(logs.iter().map(|l| l.block_number).collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn window_snapshot_round_trips() {
        let store = InMemoryStore::new();
        assert!(store.load_window().unwrap().is_none());

        let window = vec![
            BlockInfo::new(B256::repeat_byte(0x01), 1, B256::ZERO),
            BlockInfo::new(B256::repeat_byte(0x02), 2, B256::repeat_byte(0x01)),
        ];
        store.save_window(&window).unwrap();
        assert_eq!(store.load_window().unwrap(), Some(window));
    }
}
