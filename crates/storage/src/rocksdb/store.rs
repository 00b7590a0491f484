//! RocksDB Store implementation

use super::RocksSnapshot;
use crate::batch::WriteBatch;
use crate::traits::{KvBackend, KvIter, SnapshotView, StoreError, StoreResult};
use rocksdb::{Direction, IteratorMode, Options, WriteOptions, DB};
use std::path::{Path, PathBuf};
use tracing::info;

fn backend_err(e: rocksdb::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// RocksDB instance backing one logical database
pub struct RocksBackend {
    /// RocksDB instance
    db: DB,
    /// Database path
    path: PathBuf,
    /// Write options with sync disabled for performance
    write_opts: WriteOptions,
}

impl RocksBackend {
    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush memtables to disk
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush().map_err(backend_err)
    }
}

impl KvBackend for RocksBackend {
    const PERSISTENT: bool = true;

    fn open(path: &Path) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(64 * 1024 * 1024); // 64MB write buffer
        opts.set_max_write_buffer_number(4);
        opts.set_target_file_size_base(64 * 1024 * 1024); // 64MB SST files
        opts.set_level_zero_file_num_compaction_trigger(4);
        opts.set_max_background_jobs(4);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path).map_err(|e| {
            StoreError::Backend(format!(
                "failed to open RocksDB at {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(false);

        info!("RocksDB opened at: {}", path.display());

        Ok(Self {
            db,
            path: path.to_path_buf(),
            write_opts,
        })
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.db.get(key).map_err(backend_err)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.db
            .put_opt(key, value, &self.write_opts)
            .map_err(backend_err)
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.db.delete_opt(key, &self.write_opts).map_err(backend_err)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvIter<'_> {
        let prefix = prefix.to_vec();
        let iter = self
            .db
            .iterator(IteratorMode::From(&prefix, Direction::Forward));
        Box::new(
            iter.map(|item| {
                item.map(|(k, v)| (k.into_vec(), v.into_vec()))
                    .map_err(backend_err)
            })
            .take_while(move |item| match item {
                Ok((k, _)) => k.starts_with(&prefix),
                Err(_) => true,
            }),
        )
    }

    fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut rocks_batch = rocksdb::WriteBatch::default();
        for (key, op) in batch {
            match op {
                Some(value) => rocks_batch.put(&key, &value),
                None => rocks_batch.delete(&key),
            }
        }
        self.db
            .write_opt(rocks_batch, &self.write_opts)
            .map_err(backend_err)
    }

    fn snapshot(&self) -> Box<dyn SnapshotView + '_> {
        Box::new(RocksSnapshot::new(self.db.snapshot()))
    }
}
