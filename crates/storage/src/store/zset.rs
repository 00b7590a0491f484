//! Sorted Set Store implementation for DiskStore
//!
//! Every member lives in two indexes:
//! - value index: `encode_zset_value(key, member) -> score`
//! - score index: `encode_zset_score(key, member, score) -> ""`
//!
//! Each mutation updates both inside one write batch.

use super::{check_type, has_remaining, DiskStore};
use crate::batch::WriteBatch;
use crate::key_encoding::{
    decode_score, decode_zset_score, decode_zset_value, encode_score, encode_zset,
    encode_zset_score, encode_zset_value, min_zset_score, min_zset_value, KeyType,
};
use crate::traits::{KvBackend, StoreError, StoreResult, ZSetStore};
use bytes::Bytes;

fn corrupt(what: &str) -> StoreError {
    StoreError::Backend(format!("corrupt sorted set {} record", what))
}

/// Score of a member as seen through the pending batch
fn read_score<B: KvBackend>(
    backend: &B,
    batch: &WriteBatch,
    value_key: &[u8],
) -> StoreResult<Option<f64>> {
    let raw = match batch.pending(value_key) {
        Some(None) => return Ok(None),
        Some(Some(raw)) => raw.to_vec(),
        None => match backend.get(value_key)? {
            Some(raw) => raw,
            None => return Ok(None),
        },
    };
    decode_score(&raw).map(Some).ok_or_else(|| corrupt("score"))
}

/// Slice bounds of a rank range over `len` ordered members
///
/// A negative `stop` is negated and the end is `len - stop + 1`. Negative
/// bounds then count from the end and both are clamped to `0..=len`.
/// Returns None for an empty range.
pub(crate) fn range_bounds(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i128;
    let stop = if stop < 0 { -(stop as i128) } else { stop as i128 };
    let end = len - stop + 1;

    let clamp = |index: i128| -> i128 {
        if index < 0 {
            (index + len).max(0)
        } else {
            index.min(len)
        }
    };
    let (s, e) = (clamp(start as i128), clamp(end));
    if s >= e {
        None
    } else {
        Some((s as usize, e as usize))
    }
}

impl<B: KvBackend> ZSetStore for DiskStore<B> {
    fn zadd(&self, db: usize, key: &[u8], members: &[(f64, &[u8])]) -> StoreResult<usize> {
        if members.iter().any(|(score, _)| score.is_nan()) {
            return Err(StoreError::InvalidArgument(
                "value is not a valid float".to_string(),
            ));
        }

        let backend = self.dbs.write(db)?;
        let exists = check_type(&*backend, key, KeyType::ZSet)?;

        backend.write_batch(|batch| {
            let mut added = 0;
            for &(score, member) in members {
                // -0 and 0 share one score index position
                let score = if score == 0.0 { 0.0 } else { score };
                let value_key = encode_zset_value(key, member);
                match read_score(&*backend, batch, &value_key)? {
                    None => added += 1,
                    Some(old) if old == score => continue,
                    Some(old) => batch.delete(encode_zset_score(key, member, old)),
                }
                batch.put(encode_zset_score(key, member, score), Vec::new());
                batch.put(value_key, encode_score(score).to_vec());
            }
            if added > 0 && !exists {
                batch.put(encode_zset(key), Vec::new());
            }
            Ok(added)
        })
    }

    fn zscore(&self, db: usize, key: &[u8], member: &[u8]) -> StoreResult<Option<f64>> {
        let backend = self.dbs.read(db)?;
        if !check_type(&*backend, key, KeyType::ZSet)? {
            return Ok(None);
        }
        read_score(&*backend, &WriteBatch::new(), &encode_zset_value(key, member))
    }

    fn zcard(&self, db: usize, key: &[u8]) -> StoreResult<usize> {
        let backend = self.dbs.read(db)?;
        if !check_type(&*backend, key, KeyType::ZSet)? {
            return Ok(0);
        }
        backend.count_prefix(&min_zset_value(key))
    }

    fn zrange(
        &self,
        db: usize,
        key: &[u8],
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<(Bytes, f64)>> {
        let backend = self.dbs.read(db)?;
        if !check_type(&*backend, key, KeyType::ZSet)? {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for item in backend.scan_prefix(&min_zset_score(key)) {
            let (k, _) = item?;
            let score = decode_zset_score(&k).ok_or_else(|| corrupt("score index"))?;
            let member = decode_zset_value(&k).ok_or_else(|| corrupt("score index"))?;
            entries.push((Bytes::copy_from_slice(member), score));
        }

        Ok(match range_bounds(entries.len(), start, stop) {
            Some((s, e)) => entries.drain(s..e).collect(),
            None => Vec::new(),
        })
    }

    fn zrem(&self, db: usize, key: &[u8], members: &[&[u8]]) -> StoreResult<usize> {
        let backend = self.dbs.write(db)?;
        if !check_type(&*backend, key, KeyType::ZSet)? {
            return Ok(0);
        }

        backend.write_batch(|batch| {
            let mut removed = 0;
            for member in members {
                let value_key = encode_zset_value(key, member);
                if let Some(score) = read_score(&*backend, batch, &value_key)? {
                    batch.delete(encode_zset_score(key, member, score));
                    batch.delete(value_key);
                    removed += 1;
                }
            }
            if removed > 0 && !has_remaining(&*backend, batch, &min_zset_value(key))? {
                batch.delete(encode_zset(key));
            }
            Ok(removed)
        })
    }
}
