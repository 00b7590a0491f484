//! Point-in-time backup of every database
//!
//! Layout mirrors the live one, so a backed-up database opens with the same
//! engine code:
//!
//! ```text
//! root/
//!   0/ .. 15/                      live databases
//!   snapshots/<timestamp>/0/ .. 15/
//! ```
//!
//! Each database is copied from an engine snapshot in one write batch. A
//! failure stops the backup; databases already copied are left in place.

use crate::batch::WriteBatch;
use crate::manager::{DatabaseManager, DATABASE_COUNT};
use crate::traits::{KvBackend, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Directory under the root that holds every backup
pub const SNAPSHOTS_DIRNAME: &str = "snapshots";

/// Backup directory name, second precision (UTC)
pub const SNAPSHOT_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Destination directory of a backup taken at `at`
pub fn snapshot_dir(root: &Path, at: DateTime<Utc>) -> PathBuf {
    root.join(SNAPSHOTS_DIRNAME)
        .join(at.format(SNAPSHOT_TIME_FORMAT).to_string())
}

fn failed(target: &Path, reason: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("backup to {} failed: {}", target.display(), reason))
}

/// Copy every database into `root/snapshots/<now>/`
///
/// Returns the backup directory.
pub fn backup<B: KvBackend>(manager: &DatabaseManager<B>) -> StoreResult<PathBuf> {
    if !B::PERSISTENT {
        return Err(StoreError::NotSupported(
            "backup requires a persistent engine".to_string(),
        ));
    }

    let destination = snapshot_dir(manager.root(), Utc::now());
    fs::create_dir_all(&destination).map_err(|e| failed(&destination, e))?;

    for index in 0..DATABASE_COUNT {
        let target = destination.join(index.to_string());
        if let Err(e) = backup_database(manager, index, &target) {
            error!("Backup of database {} failed: {}", index, e);
            return Err(e);
        }
    }

    info!("Backup written to {}", destination.display());
    Ok(destination)
}

/// Copy one database into a fresh instance at `target`
///
/// Holds the database's shared guard while the copy runs.
pub fn backup_database<B: KvBackend>(
    manager: &DatabaseManager<B>,
    index: usize,
    target: &Path,
) -> StoreResult<usize> {
    let source = manager.read(index)?;
    let snapshot = source.snapshot();

    fs::create_dir_all(target).map_err(|e| failed(target, e))?;
    let copy = B::open(target).map_err(|e| failed(target, e))?;

    let mut batch = WriteBatch::new();
    for item in snapshot.iter() {
        let (key, value) = item.map_err(|e| failed(target, e))?;
        batch.put(key, value);
    }
    let records = batch.len();
    if records > 0 {
        copy.commit(batch).map_err(|e| failed(target, e))?;
    }

    debug!(
        "Copied {} records of database {} to {}",
        records,
        index,
        target.display()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use crate::rocksdb::RocksBackend;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_dir_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            snapshot_dir(Path::new("/data"), at),
            PathBuf::from("/data/snapshots/2024-03-09T07-05-01")
        );
    }

    #[test]
    fn test_backup_copies_every_database() {
        let dir = TempDir::new().unwrap();
        let manager = DatabaseManager::<RocksBackend>::open(dir.path()).unwrap();
        manager.write(3).unwrap().put(b"a", b"1").unwrap();
        manager.write(3).unwrap().put(b"b", b"2").unwrap();

        let destination = backup(&manager).unwrap();
        assert!(destination.starts_with(dir.path().join(SNAPSHOTS_DIRNAME)));
        for index in 0..DATABASE_COUNT {
            assert!(destination.join(index.to_string()).is_dir());
        }

        // live writes after the backup do not leak into it
        manager.write(3).unwrap().put(b"c", b"3").unwrap();

        let copy = RocksBackend::open(&destination.join("3")).unwrap();
        assert_eq!(copy.count_prefix(b"").unwrap(), 2);
        assert_eq!(copy.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_backup_rejects_volatile_engine() {
        let dir = TempDir::new().unwrap();
        let manager = DatabaseManager::<MemoryBackend>::open(dir.path()).unwrap();
        assert!(matches!(
            backup(&manager),
            Err(StoreError::NotSupported(_))
        ));
        assert!(!dir.path().join(SNAPSHOTS_DIRNAME).exists());
    }

    #[test]
    fn test_failure_names_destination() {
        let dir = TempDir::new().unwrap();
        let manager = DatabaseManager::<RocksBackend>::open(dir.path()).unwrap();
        // a plain file where the database directory should go
        let target = dir.path().join("blocked");
        fs::write(&target, b"").unwrap();

        let err = backup_database(&manager, 0, &target).unwrap_err();
        assert!(err.to_string().contains(&target.display().to_string()));
    }
}
