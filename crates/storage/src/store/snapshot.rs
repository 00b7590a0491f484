//! Snapshot Store implementation for DiskStore

use super::DiskStore;
use crate::backup;
use crate::traits::{KvBackend, SnapshotStore, StoreResult};
use std::path::PathBuf;

impl<B: KvBackend> SnapshotStore for DiskStore<B> {
    fn backup(&self) -> StoreResult<PathBuf> {
        backup::backup(&self.dbs)
    }
}
