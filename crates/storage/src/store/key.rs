//! Key Store implementation for DiskStore

use super::{delete_key, key_type, DiskStore};
use crate::key_encoding::{decode_logical_key, KeyType};
use crate::traits::{KeyStore, KvBackend, StoreError, StoreResult};
use bytes::Bytes;
use std::collections::HashSet;

impl<B: KvBackend> KeyStore for DiskStore<B> {
    fn del(&self, db: usize, keys: &[&[u8]]) -> StoreResult<usize> {
        let backend = self.dbs.write(db)?;
        backend.write_batch(|batch| {
            let mut seen = HashSet::new();
            let mut removed = 0;
            for &key in keys {
                if !seen.insert(key) {
                    continue;
                }
                if let Some(key_type) = key_type(&*backend, key)? {
                    delete_key(&*backend, batch, key, key_type)?;
                    removed += 1;
                }
            }
            Ok(removed)
        })
    }

    fn exists(&self, db: usize, keys: &[&[u8]]) -> StoreResult<usize> {
        let backend = self.dbs.read(db)?;
        let mut count = 0;
        for key in keys {
            if key_type(&*backend, key)?.is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn key_type(&self, db: usize, key: &[u8]) -> StoreResult<Option<KeyType>> {
        let backend = self.dbs.read(db)?;
        key_type(&*backend, key)
    }

    fn keys(&self, db: usize, pattern: &[u8]) -> StoreResult<Vec<Bytes>> {
        let backend = self.dbs.read(db)?;
        let mut keys = Vec::new();
        for key_type in KeyType::ALL {
            for item in backend.scan_prefix(&[key_type.type_id()]) {
                let (k, _) = item?;
                let key = decode_logical_key(&k)
                    .ok_or_else(|| StoreError::Backend("malformed key record".to_string()))?;
                if glob_match(pattern, key) {
                    keys.push(Bytes::copy_from_slice(key));
                }
            }
        }
        Ok(keys)
    }

    fn dbsize(&self, db: usize) -> StoreResult<usize> {
        let backend = self.dbs.read(db)?;
        let mut size = 0;
        for key_type in KeyType::ALL {
            size += backend.count_prefix(&[key_type.type_id()])?;
        }
        Ok(size)
    }

    fn flushdb(&self, db: usize) -> StoreResult<()> {
        self.dbs.reset(db)
    }

    fn flushall(&self) -> StoreResult<()> {
        self.dbs.reset_all()
    }
}

/// Redis-style glob matching
///
/// Supports `*`, `?`, `[abc]`, `[^abc]`, `[a-z]` and `\` escapes.
pub fn glob_match(pattern: &[u8], input: &[u8]) -> bool {
    let (mut pi, mut ii) = (0, 0);
    // position after the last `*` and the input index it was tried at
    let mut star: Option<(usize, usize)> = None;

    while ii < input.len() {
        let step = match pattern.get(pi) {
            Some(b'*') => {
                star = Some((pi + 1, ii));
                pi += 1;
                continue;
            }
            Some(b'?') => Some(1),
            Some(b'[') => match match_class(&pattern[pi..], input[ii]) {
                Some((true, consumed)) => Some(consumed),
                Some((false, _)) => None,
                // unterminated class matches a literal `[`
                None => (input[ii] == b'[').then_some(1),
            },
            Some(b'\\') if pi + 1 < pattern.len() => {
                (pattern[pi + 1] == input[ii]).then_some(2)
            }
            Some(&c) => (c == input[ii]).then_some(1),
            None => None,
        };

        match (step, star) {
            (Some(consumed), _) => {
                pi += consumed;
                ii += 1;
            }
            (None, Some((star_pi, star_ii))) => {
                pi = star_pi;
                ii = star_ii + 1;
                star = Some((star_pi, ii));
            }
            (None, None) => return false,
        }
    }

    pattern[pi.min(pattern.len())..].iter().all(|&c| c == b'*')
}

/// Match one byte against the `[...]` class at the start of `pattern`
///
/// Returns `(matched, bytes consumed)`, or None if the class is unterminated.
fn match_class(pattern: &[u8], ch: u8) -> Option<(bool, usize)> {
    let mut i = 1;
    let negate = pattern.get(i) == Some(&b'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < pattern.len() && pattern[i] != b']' {
        if pattern[i] == b'\\' && i + 1 < pattern.len() {
            matched |= pattern[i + 1] == ch;
            i += 2;
        } else if i + 2 < pattern.len() && pattern[i + 1] == b'-' && pattern[i + 2] != b']' {
            let (lo, hi) = if pattern[i] <= pattern[i + 2] {
                (pattern[i], pattern[i + 2])
            } else {
                (pattern[i + 2], pattern[i])
            };
            matched |= lo <= ch && ch <= hi;
            i += 3;
        } else {
            matched |= pattern[i] == ch;
            i += 1;
        }
    }

    if i < pattern.len() {
        Some((matched != negate, i + 1))
    } else {
        None
    }
}
