//! Database Manager
//!
//! Owns the 16 logical databases. Each one is an independent backend
//! instance rooted at `root/<index>/`.
//!
//! Lock Strategy:
//! - Read commands: `read(index)`, shared access
//! - Mutating commands: `write(index)`, exclusive per database, so a
//!   read-check-write sequence (ZADD, INCRBY, ...) never interleaves with
//!   another mutation of the same database
//! - Reset: exclusive, closes the instance, wipes its directory and reopens it

use crate::traits::{KvBackend, StoreError, StoreResult};
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Number of logical databases
pub const DATABASE_COUNT: usize = 16;

/// Shared access to one database's backend
pub type DbReadGuard<'a, B> = MappedRwLockReadGuard<'a, B>;

/// Exclusive access to one database's backend
pub type DbWriteGuard<'a, B> = MappedRwLockWriteGuard<'a, B>;

struct DatabaseSlot<B> {
    path: PathBuf,
    /// None only if reopening after a reset failed
    backend: RwLock<Option<B>>,
}

pub struct DatabaseManager<B: KvBackend> {
    root: PathBuf,
    slots: Vec<DatabaseSlot<B>>,
}

fn io_err(context: &str, path: &Path, e: io::Error) -> StoreError {
    StoreError::Backend(format!("{} {}: {}", context, path.display(), e))
}

impl<B: KvBackend> DatabaseManager<B> {
    /// Open every database under `root`, creating directories as needed
    pub fn open<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        let mut slots = Vec::with_capacity(DATABASE_COUNT);
        for index in 0..DATABASE_COUNT {
            let path = root.join(index.to_string());
            fs::create_dir_all(&path).map_err(|e| io_err("failed to create", &path, e))?;
            let backend = B::open(&path)?;
            slots.push(DatabaseSlot {
                path,
                backend: RwLock::new(Some(backend)),
            });
        }

        info!(
            "Opened {} databases under {}",
            DATABASE_COUNT,
            root.display()
        );

        Ok(Self { root, slots })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one database
    pub fn path(&self, index: usize) -> StoreResult<&Path> {
        Ok(&self.slot(index)?.path)
    }

    fn slot(&self, index: usize) -> StoreResult<&DatabaseSlot<B>> {
        self.slots
            .get(index)
            .ok_or(StoreError::DatabaseOutOfRange(index))
    }

    fn closed(index: usize) -> StoreError {
        StoreError::Backend(format!("database {} is closed", index))
    }

    /// Shared access to a database
    pub fn read(&self, index: usize) -> StoreResult<DbReadGuard<'_, B>> {
        let guard = self.slot(index)?.backend.read();
        RwLockReadGuard::try_map(guard, |backend| backend.as_ref())
            .map_err(|_| Self::closed(index))
    }

    /// Exclusive access to a database
    pub fn write(&self, index: usize) -> StoreResult<DbWriteGuard<'_, B>> {
        let guard = self.slot(index)?.backend.write();
        RwLockWriteGuard::try_map(guard, |backend| backend.as_mut())
            .map_err(|_| Self::closed(index))
    }

    /// Flush one database: close, wipe the directory, reopen empty
    ///
    /// Waits for every outstanding guard on this database to be released.
    pub fn reset(&self, index: usize) -> StoreResult<()> {
        let slot = self.slot(index)?;
        let mut backend = slot.backend.write();

        // dropping the instance closes it before its files are removed
        drop(backend.take());

        match fs::remove_dir_all(&slot.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!("Failed to wipe database {}: {}", index, e);
                return Err(io_err("failed to remove", &slot.path, e));
            }
        }
        fs::create_dir_all(&slot.path).map_err(|e| io_err("failed to create", &slot.path, e))?;

        *backend = Some(B::open(&slot.path)?);
        info!("Reset database {} at {}", index, slot.path.display());
        Ok(())
    }

    /// Flush every database
    pub fn reset_all(&self) -> StoreResult<()> {
        for index in 0..DATABASE_COUNT {
            self.reset(index)?;
        }
        Ok(())
    }
}
