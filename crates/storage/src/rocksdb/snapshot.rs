//! Point-in-time views over a RocksDB instance

use crate::traits::{KvIter, SnapshotView, StoreError};
use rocksdb::{IteratorMode, Snapshot};

/// RocksDB snapshot
///
/// Released when dropped.
pub struct RocksSnapshot<'a> {
    snapshot: Snapshot<'a>,
}

impl<'a> RocksSnapshot<'a> {
    pub(crate) fn new(snapshot: Snapshot<'a>) -> Self {
        Self { snapshot }
    }
}

impl SnapshotView for RocksSnapshot<'_> {
    fn iter(&self) -> KvIter<'_> {
        Box::new(self.snapshot.iterator(IteratorMode::Start).map(|item| {
            item.map(|(k, v)| (k.into_vec(), v.into_vec()))
                .map_err(|e| StoreError::Backend(format!("snapshot iteration error: {}", e)))
        }))
    }
}
