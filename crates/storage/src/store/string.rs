//! String Store implementation for DiskStore

use super::{check_type, delete_key, key_type, DiskStore};
use crate::key_encoding::{encode_string, KeyType};
use crate::traits::{KvBackend, StoreError, StoreResult, StringStore};
use bytes::Bytes;

fn parse_integer(value: &[u8]) -> StoreResult<i64> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(StoreError::NotANumber)
}

impl<B: KvBackend> StringStore for DiskStore<B> {
    fn get(&self, db: usize, key: &[u8]) -> StoreResult<Option<Bytes>> {
        let backend = self.dbs.read(db)?;
        if let Some(value) = backend.get(&encode_string(key))? {
            return Ok(Some(Bytes::from(value)));
        }
        match key_type(&*backend, key)? {
            Some(_) => Err(StoreError::WrongType),
            None => Ok(None),
        }
    }

    fn set(&self, db: usize, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let backend = self.dbs.write(db)?;
        backend.write_batch(|batch| {
            // SET replaces a key of any type
            if let Some(previous) = key_type(&*backend, key)? {
                if previous != KeyType::String {
                    delete_key(&*backend, batch, key, previous)?;
                }
            }
            batch.put(encode_string(key), value);
            Ok(())
        })
    }

    fn incrby(&self, db: usize, key: &[u8], delta: i64) -> StoreResult<i64> {
        let backend = self.dbs.write(db)?;
        let current = if check_type(&*backend, key, KeyType::String)? {
            match backend.get(&encode_string(key))? {
                Some(value) => parse_integer(&value)?,
                None => 0,
            }
        } else {
            0
        };

        let next = current.checked_add(delta).ok_or(StoreError::NotANumber)?;
        backend.put(&encode_string(key), next.to_string().as_bytes())?;
        Ok(next)
    }
}
