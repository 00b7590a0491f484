//! Hash Store implementation for DiskStore

use super::{check_type, has_remaining, DiskStore};
use crate::key_encoding::{decode_suffix, encode_hash, encode_hash_field, min_hash_field, KeyType};
use crate::traits::{HashStore, KvBackend, StoreError, StoreResult};
use bytes::Bytes;

impl<B: KvBackend> HashStore for DiskStore<B> {
    fn hset(&self, db: usize, key: &[u8], field: &[u8], value: &[u8]) -> StoreResult<bool> {
        let backend = self.dbs.write(db)?;
        let exists = check_type(&*backend, key, KeyType::Hash)?;
        let field_key = encode_hash_field(key, field);
        let is_new = !exists || !backend.exists(&field_key)?;

        backend.write_batch(|batch| {
            if !exists {
                batch.put(encode_hash(key), Vec::new());
            }
            batch.put(field_key, value);
            Ok(is_new)
        })
    }

    fn hget(&self, db: usize, key: &[u8], field: &[u8]) -> StoreResult<Option<Bytes>> {
        let backend = self.dbs.read(db)?;
        if !check_type(&*backend, key, KeyType::Hash)? {
            return Ok(None);
        }
        Ok(backend.get(&encode_hash_field(key, field))?.map(Bytes::from))
    }

    fn hdel(&self, db: usize, key: &[u8], fields: &[&[u8]]) -> StoreResult<usize> {
        let backend = self.dbs.write(db)?;
        if !check_type(&*backend, key, KeyType::Hash)? {
            return Ok(0);
        }

        backend.write_batch(|batch| {
            let mut removed = 0;
            for field in fields {
                let field_key = encode_hash_field(key, field);
                if !batch.is_deleted(&field_key) && backend.exists(&field_key)? {
                    batch.delete(field_key);
                    removed += 1;
                }
            }
            if removed > 0 && !has_remaining(&*backend, batch, &min_hash_field(key))? {
                batch.delete(encode_hash(key));
            }
            Ok(removed)
        })
    }

    fn hexists(&self, db: usize, key: &[u8], field: &[u8]) -> StoreResult<bool> {
        Ok(self.hget(db, key, field)?.is_some())
    }

    fn hlen(&self, db: usize, key: &[u8]) -> StoreResult<usize> {
        let backend = self.dbs.read(db)?;
        if !check_type(&*backend, key, KeyType::Hash)? {
            return Ok(0);
        }
        backend.count_prefix(&min_hash_field(key))
    }

    fn hgetall(&self, db: usize, key: &[u8]) -> StoreResult<Vec<(Bytes, Bytes)>> {
        let backend = self.dbs.read(db)?;
        if !check_type(&*backend, key, KeyType::Hash)? {
            return Ok(Vec::new());
        }

        let mut pairs = Vec::new();
        for item in backend.scan_prefix(&min_hash_field(key)) {
            let (k, v) = item?;
            let field = decode_suffix(&k)
                .ok_or_else(|| StoreError::Backend("malformed hash field record".to_string()))?;
            pairs.push((Bytes::copy_from_slice(field), Bytes::from(v)));
        }
        Ok(pairs)
    }
}
