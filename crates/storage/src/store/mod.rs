//! Disk-backed Redis store
//!
//! `DiskStore` implements the Redis operation traits on top of a
//! `DatabaseManager`. Every command borrows one database's backend for the
//! duration of the call and never keeps it afterwards.
//!
//! ## Entity markers
//!
//! Composite keys (set, hash, zset) carry a marker record
//! `encode_set/hash/zset(key) -> ""` next to their elements. The marker is
//! written together with the first element and deleted together with the
//! last, so a key's type is found with at most four point lookups.
//!
//! Lock Strategy:
//! - Read commands: shared guard on the database
//! - Mutating commands: exclusive guard, held across the read-check-write
//!   sequence and the batch commit

mod hash;
mod key;
mod redis;
mod set;
mod snapshot;
mod string;
mod zset;

pub use key::glob_match;

use crate::batch::WriteBatch;
use crate::key_encoding::{encode_marker, get_key, KeyType};
use crate::manager::DatabaseManager;
use crate::traits::{KvBackend, StoreError, StoreResult};
use std::path::Path;

/// Redis store over 16 logical databases
pub struct DiskStore<B: KvBackend> {
    dbs: DatabaseManager<B>,
}

impl<B: KvBackend> DiskStore<B> {
    /// Open (or create) every database under `root`
    pub fn open<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        Ok(Self {
            dbs: DatabaseManager::open(root)?,
        })
    }

    pub fn manager(&self) -> &DatabaseManager<B> {
        &self.dbs
    }
}

/// Current type of `key`, if it exists
pub(crate) fn key_type<B: KvBackend>(backend: &B, key: &[u8]) -> StoreResult<Option<KeyType>> {
    for key_type in KeyType::ALL {
        if backend.exists(&encode_marker(key, key_type))? {
            return Ok(Some(key_type));
        }
    }
    Ok(None)
}

/// Whether `key` exists as `expected`
///
/// Ok(false) if the key is absent, `WrongType` if it holds another type.
pub(crate) fn check_type<B: KvBackend>(
    backend: &B,
    key: &[u8],
    expected: KeyType,
) -> StoreResult<bool> {
    match key_type(backend, key)? {
        None => Ok(false),
        Some(actual) if actual == expected => Ok(true),
        Some(_) => Err(StoreError::WrongType),
    }
}

/// Whether any record under `prefix` survives once `batch` is applied
pub(crate) fn has_remaining<B: KvBackend>(
    backend: &B,
    batch: &WriteBatch,
    prefix: &[u8],
) -> StoreResult<bool> {
    let pending_put = batch
        .iter()
        .any(|(k, v)| v.is_some() && k.starts_with(prefix));
    if pending_put {
        return Ok(true);
    }
    for item in backend.scan_prefix(prefix) {
        let (k, _) = item?;
        if !batch.is_deleted(&k) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Buffer the deletion of every record of `key`
pub(crate) fn delete_key<B: KvBackend>(
    backend: &B,
    batch: &mut WriteBatch,
    key: &[u8],
    key_type: KeyType,
) -> StoreResult<()> {
    batch.delete(encode_marker(key, key_type));
    for &type_id in key_type.element_type_ids() {
        for item in backend.scan_prefix(&get_key(key, type_id)) {
            let (k, _) = item?;
            batch.delete(k);
        }
    }
    Ok(())
}
