//! Buffered write batch
//!
//! Writes are recorded in key order and handed to the backend as a single
//! atomic commit. The last operation recorded for a key wins, so a `delete`
//! cancels a pending `put` for the same key and vice versa.

use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    /// key -> Some(value) for puts, None for deletes
    ops: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.insert(key.into(), Some(value.into()));
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.insert(key.into(), None);
    }

    /// Buffered state of a key
    ///
    /// - `None`: nothing recorded
    /// - `Some(None)`: pending delete
    /// - `Some(Some(value))`: pending put
    pub fn pending(&self, key: &[u8]) -> Option<Option<&[u8]>> {
        self.ops.get(key).map(|op| op.as_deref())
    }

    pub fn is_deleted(&self, key: &[u8]) -> bool {
        matches!(self.pending(key), Some(None))
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Recorded operations in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], Option<&[u8]>)> {
        self.ops.iter().map(|(k, v)| (k.as_slice(), v.as_deref()))
    }
}

impl IntoIterator for WriteBatch {
    type Item = (Vec<u8>, Option<Vec<u8>>);
    type IntoIter = std::collections::btree_map::IntoIter<Vec<u8>, Option<Vec<u8>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_cancels_put() {
        let mut batch = WriteBatch::new();
        batch.put(b"k".to_vec(), b"v".to_vec());
        assert_eq!(batch.pending(b"k"), Some(Some(&b"v"[..])));

        batch.delete(b"k".to_vec());
        assert!(batch.is_deleted(b"k"));
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_put_after_delete_wins() {
        let mut batch = WriteBatch::new();
        batch.delete(b"k".to_vec());
        batch.put(b"k".to_vec(), b"v2".to_vec());
        assert_eq!(batch.pending(b"k"), Some(Some(&b"v2"[..])));
        assert_eq!(batch.pending(b"other"), None);
    }

    #[test]
    fn test_iter_in_key_order() {
        let mut batch = WriteBatch::new();
        batch.put(b"b".to_vec(), b"2".to_vec());
        batch.put(b"a".to_vec(), b"1".to_vec());
        batch.delete(b"c".to_vec());

        let keys: Vec<&[u8]> = batch.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![&b"a"[..], &b"b"[..], &b"c"[..]]);
    }
}
