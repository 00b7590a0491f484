//! In-memory ordered store

use crate::batch::WriteBatch;
use crate::traits::{KvBackend, KvIter, KvPair, SnapshotView, StoreError, StoreResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;
use tracing::debug;

type Records = BTreeMap<Vec<u8>, Vec<u8>>;

/// Volatile ordered store
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: RwLock<Records>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

/// Lazy prefix cursor
///
/// Holds no lock between steps: every `next` takes the read lock, seeks past
/// the last returned key and releases the lock again.
struct PrefixCursor<'a> {
    data: &'a RwLock<Records>,
    prefix: Vec<u8>,
    from: Bound<Vec<u8>>,
    done: bool,
}

impl Iterator for PrefixCursor<'_> {
    type Item = StoreResult<KvPair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let data = self.data.read();
        let next = data
            .range::<Vec<u8>, _>((self.from.clone(), Bound::Unbounded))
            .next();
        match next {
            Some((k, v)) if k.starts_with(&self.prefix) => {
                self.from = Bound::Excluded(k.clone());
                Some(Ok((k.clone(), v.clone())))
            }
            _ => {
                self.done = true;
                None
            }
        }
    }
}

/// Frozen copy of a `MemoryBackend`
pub struct MemorySnapshot {
    records: Records,
}

impl SnapshotView for MemorySnapshot {
    fn iter(&self) -> KvIter<'_> {
        Box::new(
            self.records
                .iter()
                .map(|(k, v)| Ok::<KvPair, StoreError>((k.clone(), v.clone()))),
        )
    }
}

impl KvBackend for MemoryBackend {
    const PERSISTENT: bool = false;

    fn open(path: &Path) -> StoreResult<Self> {
        debug!("Memory backend opened for {}", path.display());
        Ok(Self::new())
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvIter<'_> {
        Box::new(PrefixCursor {
            data: &self.data,
            prefix: prefix.to_vec(),
            from: Bound::Included(prefix.to_vec()),
            done: false,
        })
    }

    fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let mut data = self.data.write();
        for (key, op) in batch {
            match op {
                Some(value) => {
                    data.insert(key, value);
                }
                None => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn snapshot(&self) -> Box<dyn SnapshotView + '_> {
        Box::new(MemorySnapshot {
            records: self.data.read().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_prefix_is_ordered_and_bounded() {
        let db = MemoryBackend::new();
        db.put(b"p2", b"b").unwrap();
        db.put(b"p1", b"a").unwrap();
        db.put(b"q", b"c").unwrap();
        db.put(b"o", b"d").unwrap();

        let entries: Vec<KvPair> = db.scan_prefix(b"p").map(|item| item.unwrap()).collect();
        assert_eq!(
            entries,
            vec![
                (b"p1".to_vec(), b"a".to_vec()),
                (b"p2".to_vec(), b"b".to_vec())
            ]
        );
    }

    #[test]
    fn test_cursor_holds_no_lock_between_steps() {
        let db = MemoryBackend::new();
        db.put(b"k1", b"").unwrap();
        db.put(b"k2", b"").unwrap();

        let mut cursor = db.scan_prefix(b"k");
        assert_eq!(cursor.next().unwrap().unwrap().0, b"k1".to_vec());
        // writing while the cursor is alive must not deadlock
        db.delete(b"k2").unwrap();
        db.put(b"k3", b"").unwrap();
        assert_eq!(cursor.next().unwrap().unwrap().0, b"k3".to_vec());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_commit_and_snapshot() {
        let db = MemoryBackend::new();
        db.put(b"gone", b"x").unwrap();

        let mut batch = WriteBatch::new();
        batch.put(b"a".to_vec(), b"1".to_vec());
        batch.delete(b"gone".to_vec());
        db.commit(batch).unwrap();

        let snapshot = db.snapshot();
        db.put(b"late", b"z").unwrap();

        let keys: Vec<Vec<u8>> = snapshot.iter().map(|item| item.unwrap().0).collect();
        assert_eq!(keys, vec![b"a".to_vec()]);
        assert_eq!(db.len(), 2);
    }
}
