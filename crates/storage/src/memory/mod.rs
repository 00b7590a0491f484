//! Memory storage implementation
//!
//! Volatile `KvBackend`: an ordered `BTreeMap` behind a read-write lock.
//! Same byte ordering and batch semantics as the RocksDB backend, nothing
//! survives a reopen.

mod store;

pub use store::{MemoryBackend, MemorySnapshot};
