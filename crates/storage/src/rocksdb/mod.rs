//! RocksDB-based persistent backend
//!
//! One RocksDB instance per logical database, all records in the default
//! Column Family. Keys are the physical keys produced by `key_encoding`, so
//! RocksDB's byte order is the iteration order every command relies on.
//!
//! ## Module Structure
//!
//! - `store.rs`: `RocksBackend`, the `KvBackend` implementation
//! - `snapshot.rs`: point-in-time views used by backups

mod snapshot;
mod store;

pub use snapshot::RocksSnapshot;
pub use store::RocksBackend;
