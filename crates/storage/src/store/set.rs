//! Set Store implementation for DiskStore

use super::{check_type, has_remaining, DiskStore};
use crate::key_encoding::{decode_suffix, encode_set, encode_set_member, min_set_member, KeyType};
use crate::traits::{KvBackend, SetStore, StoreError, StoreResult};
use bytes::Bytes;

impl<B: KvBackend> SetStore for DiskStore<B> {
    fn sadd(&self, db: usize, key: &[u8], members: &[&[u8]]) -> StoreResult<usize> {
        let backend = self.dbs.write(db)?;
        let exists = check_type(&*backend, key, KeyType::Set)?;

        backend.write_batch(|batch| {
            let mut added = 0;
            for member in members {
                let member_key = encode_set_member(key, member);
                let present = match batch.pending(&member_key) {
                    Some(op) => op.is_some(),
                    None => backend.exists(&member_key)?,
                };
                if !present {
                    batch.put(member_key, Vec::new());
                    added += 1;
                }
            }
            if added > 0 && !exists {
                batch.put(encode_set(key), Vec::new());
            }
            Ok(added)
        })
    }

    fn srem(&self, db: usize, key: &[u8], members: &[&[u8]]) -> StoreResult<usize> {
        let backend = self.dbs.write(db)?;
        if !check_type(&*backend, key, KeyType::Set)? {
            return Ok(0);
        }

        backend.write_batch(|batch| {
            let mut removed = 0;
            for member in members {
                let member_key = encode_set_member(key, member);
                if !batch.is_deleted(&member_key) && backend.exists(&member_key)? {
                    batch.delete(member_key);
                    removed += 1;
                }
            }
            if removed > 0 && !has_remaining(&*backend, batch, &min_set_member(key))? {
                batch.delete(encode_set(key));
            }
            Ok(removed)
        })
    }

    fn sismember(&self, db: usize, key: &[u8], member: &[u8]) -> StoreResult<bool> {
        let backend = self.dbs.read(db)?;
        if !check_type(&*backend, key, KeyType::Set)? {
            return Ok(false);
        }
        backend.exists(&encode_set_member(key, member))
    }

    fn smembers(&self, db: usize, key: &[u8]) -> StoreResult<Vec<Bytes>> {
        let backend = self.dbs.read(db)?;
        if !check_type(&*backend, key, KeyType::Set)? {
            return Ok(Vec::new());
        }

        let mut members = Vec::new();
        for item in backend.scan_prefix(&min_set_member(key)) {
            let (k, _) = item?;
            let member = decode_suffix(&k)
                .ok_or_else(|| StoreError::Backend("malformed set member record".to_string()))?;
            members.push(Bytes::copy_from_slice(member));
        }
        Ok(members)
    }

    fn scard(&self, db: usize, key: &[u8]) -> StoreResult<usize> {
        let backend = self.dbs.read(db)?;
        if !check_type(&*backend, key, KeyType::Set)? {
            return Ok(0);
        }
        backend.count_prefix(&min_set_member(key))
    }
}
