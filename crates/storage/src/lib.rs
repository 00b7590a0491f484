pub mod backup;
pub mod batch;
pub mod command;
pub mod key_encoding;
pub mod manager;
pub mod memory;
pub mod rocksdb;
pub mod script;
pub mod store;
pub mod traits;

// Re-export commonly used types
pub use batch::WriteBatch;
pub use command::{Command, CommandResult, CommandType};
pub use key_encoding::KeyType;
pub use manager::{DatabaseManager, DATABASE_COUNT};
pub use memory::MemoryBackend;
pub use rocksdb::RocksBackend;
pub use script::{ScriptBridge, ScriptError};
pub use store::DiskStore;
pub use traits::{
    HashStore, KeyStore, KvBackend, RedisStore, SetStore, SnapshotStore, StoreError, StoreResult,
    StringStore, ZSetStore,
};
