//! Storage trait definitions
//!
//! Two layers of traits live here:
//!
//! - `KvBackend` / `SnapshotView`: the capability interface an embedded
//!   ordered store must provide (get, put, delete, prefix scan, atomic batch
//!   commit, point-in-time snapshot)
//! - `StringStore`, `SetStore`, `HashStore`, `ZSetStore`, `KeyStore`,
//!   `SnapshotStore`: Redis operations, grouped by data structure, addressed
//!   by logical database index
//! - `RedisStore`: all of the above plus command dispatch

use crate::batch::WriteBatch;
use crate::command::{format_score, Command, CommandResult};
use crate::key_encoding::KeyType;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tracing::debug;

// ============================================================================
// Error Types
// ============================================================================

/// Redis storage error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Value is not an integer, or the increment overflowed
    NotANumber,
    /// Type mismatch (e.g., performing Set operations on a String)
    WrongType,
    /// Command name not present in the command table
    UnknownCommand(String),
    /// Wrong number of arguments for a command
    WrongArity(String),
    /// Invalid argument
    InvalidArgument(String),
    /// Database index outside `0..DATABASE_COUNT`
    DatabaseOutOfRange(usize),
    /// Embedded store failure (I/O, corruption, closed database)
    Backend(String),
    /// Operation not supported by this engine
    NotSupported(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotANumber => write!(f, "ERR value is not an integer or out of range"),
            StoreError::WrongType => {
                write!(
                    f,
                    "WRONGTYPE Operation against a key holding the wrong kind of value"
                )
            }
            StoreError::UnknownCommand(name) => write!(f, "ERR unknown command '{}'", name),
            StoreError::WrongArity(name) => write!(
                f,
                "ERR wrong number of arguments for '{}' command",
                name.to_lowercase()
            ),
            StoreError::InvalidArgument(msg) => write!(f, "ERR {}", msg),
            StoreError::DatabaseOutOfRange(index) => {
                write!(f, "ERR DB index is out of range: {}", index)
            }
            StoreError::Backend(msg) => write!(f, "ERR backend error: {}", msg),
            StoreError::NotSupported(msg) => write!(f, "ERR operation not supported: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Backend Capability Interface
// ============================================================================

/// Physical record
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Lazy, ascending sequence of physical records
pub type KvIter<'a> = Box<dyn Iterator<Item = StoreResult<KvPair>> + 'a>;

/// Read-only, point-in-time view of a backend
///
/// Writes committed after the view was taken are not visible through it.
pub trait SnapshotView {
    /// Every record of the view in ascending key order
    fn iter(&self) -> KvIter<'_>;
}

/// Embedded ordered key-value store
///
/// One instance backs one logical database. Dropping the instance closes it.
pub trait KvBackend: Send + Sync + Sized {
    /// Whether data written through this engine survives a reopen
    const PERSISTENT: bool;

    /// Open (or create) an instance rooted at `path`
    fn open(path: &Path) -> StoreResult<Self>;

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    fn delete(&self, key: &[u8]) -> StoreResult<()>;

    /// Scan all records whose key starts with `prefix`, ascending
    ///
    /// Each call starts a fresh scan from `prefix`.
    fn scan_prefix(&self, prefix: &[u8]) -> KvIter<'_>;

    /// Apply every buffered write as one atomic transaction
    fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Take a consistent point-in-time view
    fn snapshot(&self) -> Box<dyn SnapshotView + '_>;

    /// Run `f` against a fresh batch and commit it only if `f` succeeds
    ///
    /// On error nothing buffered by `f` reaches the store.
    fn write_batch<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut WriteBatch) -> StoreResult<T>,
    {
        let mut batch = WriteBatch::new();
        let result = f(&mut batch)?;
        if !batch.is_empty() {
            self.commit(batch)?;
        }
        Ok(result)
    }

    fn exists(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Number of records under `prefix`
    fn count_prefix(&self, prefix: &[u8]) -> StoreResult<usize> {
        let mut count = 0;
        for item in self.scan_prefix(prefix) {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

// ============================================================================
// String Store Trait
// ============================================================================

/// String data structure operations
///
/// Supports: GET, SET, INCR, INCRBY, DECR, DECRBY
pub trait StringStore: Send + Sync {
    /// GET: Get string value
    fn get(&self, db: usize, key: &[u8]) -> StoreResult<Option<Bytes>>;

    /// SET: Set string value, overwriting a string of any previous value
    fn set(&self, db: usize, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// INCRBY: Increment integer by specified value (missing key counts as 0)
    fn incrby(&self, db: usize, key: &[u8], delta: i64) -> StoreResult<i64>;

    /// INCR: Increment integer by 1
    fn incr(&self, db: usize, key: &[u8]) -> StoreResult<i64> {
        self.incrby(db, key, 1)
    }

    /// DECR: Decrement integer by 1
    fn decr(&self, db: usize, key: &[u8]) -> StoreResult<i64> {
        self.incrby(db, key, -1)
    }

    /// DECRBY: Decrement integer by specified value
    fn decrby(&self, db: usize, key: &[u8], delta: i64) -> StoreResult<i64> {
        let delta = delta.checked_neg().ok_or(StoreError::NotANumber)?;
        self.incrby(db, key, delta)
    }
}

// ============================================================================
// Set Store Trait
// ============================================================================

/// Set data structure operations
///
/// Supports: SADD, SREM, SISMEMBER, SMEMBERS, SCARD
pub trait SetStore: Send + Sync {
    /// SADD: Add members, returns the number newly added
    fn sadd(&self, db: usize, key: &[u8], members: &[&[u8]]) -> StoreResult<usize>;

    /// SREM: Remove members, returns the number removed
    fn srem(&self, db: usize, key: &[u8], members: &[&[u8]]) -> StoreResult<usize>;

    /// SISMEMBER: Check membership
    fn sismember(&self, db: usize, key: &[u8], member: &[u8]) -> StoreResult<bool>;

    /// SMEMBERS: All members, in no particular order
    fn smembers(&self, db: usize, key: &[u8]) -> StoreResult<Vec<Bytes>>;

    /// SCARD: Number of members
    fn scard(&self, db: usize, key: &[u8]) -> StoreResult<usize>;
}

// ============================================================================
// Hash Store Trait
// ============================================================================

/// Hash data structure operations
///
/// Supports: HSET, HGET, HDEL, HEXISTS, HLEN, HKEYS, HVALS, HGETALL
pub trait HashStore: Send + Sync {
    /// HSET: Set field value, returns true if the field is new
    fn hset(&self, db: usize, key: &[u8], field: &[u8], value: &[u8]) -> StoreResult<bool>;

    /// HGET: Get field value
    fn hget(&self, db: usize, key: &[u8], field: &[u8]) -> StoreResult<Option<Bytes>>;

    /// HDEL: Delete fields, returns the number removed
    fn hdel(&self, db: usize, key: &[u8], fields: &[&[u8]]) -> StoreResult<usize>;

    /// HEXISTS: Check if field exists
    fn hexists(&self, db: usize, key: &[u8], field: &[u8]) -> StoreResult<bool>;

    /// HLEN: Number of fields
    fn hlen(&self, db: usize, key: &[u8]) -> StoreResult<usize>;

    /// HGETALL: All field-value pairs, ordered by field
    fn hgetall(&self, db: usize, key: &[u8]) -> StoreResult<Vec<(Bytes, Bytes)>>;

    /// HKEYS: All fields
    fn hkeys(&self, db: usize, key: &[u8]) -> StoreResult<Vec<Bytes>> {
        Ok(self.hgetall(db, key)?.into_iter().map(|(f, _)| f).collect())
    }

    /// HVALS: All values
    fn hvals(&self, db: usize, key: &[u8]) -> StoreResult<Vec<Bytes>> {
        Ok(self.hgetall(db, key)?.into_iter().map(|(_, v)| v).collect())
    }
}

// ============================================================================
// Sorted Set Store Trait
// ============================================================================

/// Sorted set data structure operations
///
/// Supports: ZADD, ZSCORE, ZCARD, ZRANGE, ZREM
pub trait ZSetStore: Send + Sync {
    /// ZADD: Add or rescore members, returns the number of new members
    fn zadd(&self, db: usize, key: &[u8], members: &[(f64, &[u8])]) -> StoreResult<usize>;

    /// ZSCORE: Score of a member
    fn zscore(&self, db: usize, key: &[u8], member: &[u8]) -> StoreResult<Option<f64>>;

    /// ZCARD: Number of members
    fn zcard(&self, db: usize, key: &[u8]) -> StoreResult<usize>;

    /// ZRANGE: Members ordered by (score, member), sliced by rank
    fn zrange(
        &self,
        db: usize,
        key: &[u8],
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<(Bytes, f64)>>;

    /// ZREM: Remove members, returns the number removed
    fn zrem(&self, db: usize, key: &[u8], members: &[&[u8]]) -> StoreResult<usize>;
}

// ============================================================================
// Key Store Trait
// ============================================================================

/// Generic key operations
///
/// Supports: DEL, EXISTS, TYPE, KEYS, DBSIZE, FLUSHDB, FLUSHALL
pub trait KeyStore: Send + Sync {
    /// DEL: Delete keys of any type, returns the number of keys removed
    fn del(&self, db: usize, keys: &[&[u8]]) -> StoreResult<usize>;

    /// EXISTS: Number of the given keys that exist
    fn exists(&self, db: usize, keys: &[&[u8]]) -> StoreResult<usize>;

    /// TYPE: Data type of a key
    fn key_type(&self, db: usize, key: &[u8]) -> StoreResult<Option<KeyType>>;

    /// KEYS: Keys matching a glob pattern
    fn keys(&self, db: usize, pattern: &[u8]) -> StoreResult<Vec<Bytes>>;

    /// DBSIZE: Number of keys in a database
    fn dbsize(&self, db: usize) -> StoreResult<usize>;

    /// FLUSHDB: Remove every key of one database
    fn flushdb(&self, db: usize) -> StoreResult<()>;

    /// FLUSHALL: Remove every key of every database
    fn flushall(&self) -> StoreResult<()>;
}

// ============================================================================
// Snapshot Store Trait
// ============================================================================

/// Snapshot operations
pub trait SnapshotStore: Send + Sync {
    /// Copy every database into a new timestamped snapshot directory
    ///
    /// Returns the snapshot directory.
    fn backup(&self) -> StoreResult<PathBuf>;
}

// ============================================================================
// Redis Store Trait (Combined)
// ============================================================================

fn as_slices(items: &[Bytes]) -> Vec<&[u8]> {
    items.iter().map(|item| item.as_ref()).collect()
}

/// Complete Redis store
///
/// Combines every data structure trait and dispatches parsed commands to
/// them. Implementors only provide the per-type operations.
pub trait RedisStore:
    StringStore + SetStore + HashStore + ZSetStore + KeyStore + SnapshotStore
{
    /// Execute a command against database `db`
    fn execute(&self, db: usize, cmd: &Command) -> StoreResult<CommandResult> {
        debug!("db {}: executing {}", db, cmd.name());

        let result = match cmd {
            // ==================== Connection/Management Commands ====================
            Command::Ping { message } => match message {
                Some(message) => CommandResult::value(Some(message.clone())),
                None => CommandResult::Pong,
            },
            Command::Echo { message } => CommandResult::value(Some(message.clone())),
            Command::DbSize => CommandResult::from_count(self.dbsize(db)?),
            Command::FlushDb => {
                self.flushdb(db)?;
                CommandResult::ok()
            }
            Command::FlushAll => {
                self.flushall()?;
                CommandResult::ok()
            }
            Command::Save => {
                self.backup()?;
                CommandResult::ok()
            }

            // ==================== Key Commands ====================
            Command::Del { keys } => CommandResult::from_count(self.del(db, &as_slices(keys))?),
            Command::Exists { keys } => {
                CommandResult::from_count(self.exists(db, &as_slices(keys))?)
            }
            Command::Type { key } => {
                let name = self.key_type(db, key)?.map_or("none", KeyType::as_str);
                CommandResult::Status(name.to_string())
            }
            Command::Keys { pattern } => CommandResult::array(self.keys(db, pattern)?),

            // ==================== String Commands ====================
            Command::Get { key } => CommandResult::value(StringStore::get(self, db, key)?),
            Command::Set { key, value } => {
                self.set(db, key, value)?;
                CommandResult::ok()
            }
            Command::Incr { key } => CommandResult::integer(self.incr(db, key)?),
            Command::IncrBy { key, delta } => CommandResult::integer(self.incrby(db, key, *delta)?),
            Command::Decr { key } => CommandResult::integer(self.decr(db, key)?),
            Command::DecrBy { key, delta } => CommandResult::integer(self.decrby(db, key, *delta)?),

            // ==================== Set Commands ====================
            Command::SAdd { key, members } => {
                CommandResult::from_count(self.sadd(db, key, &as_slices(members))?)
            }
            Command::SRem { key, members } => {
                CommandResult::from_count(self.srem(db, key, &as_slices(members))?)
            }
            Command::SIsMember { key, member } => {
                CommandResult::from_bool(self.sismember(db, key, member)?)
            }
            Command::SMembers { key } => CommandResult::array(self.smembers(db, key)?),
            Command::SCard { key } => CommandResult::from_count(self.scard(db, key)?),

            // ==================== Hash Commands ====================
            Command::HSet { key, field, value } => {
                CommandResult::from_bool(self.hset(db, key, field, value)?)
            }
            Command::HGet { key, field } => CommandResult::value(self.hget(db, key, field)?),
            Command::HDel { key, fields } => {
                CommandResult::from_count(self.hdel(db, key, &as_slices(fields))?)
            }
            Command::HExists { key, field } => {
                CommandResult::from_bool(self.hexists(db, key, field)?)
            }
            Command::HLen { key } => CommandResult::from_count(self.hlen(db, key)?),
            Command::HKeys { key } => CommandResult::array(self.hkeys(db, key)?),
            Command::HVals { key } => CommandResult::array(self.hvals(db, key)?),
            Command::HGetAll { key } => CommandResult::array(
                self.hgetall(db, key)?
                    .into_iter()
                    .flat_map(|(field, value)| [field, value])
                    .collect(),
            ),

            // ==================== Sorted Set Commands ====================
            Command::ZAdd { key, members } => {
                let members: Vec<(f64, &[u8])> = members
                    .iter()
                    .map(|(score, member)| (*score, member.as_ref()))
                    .collect();
                CommandResult::from_count(self.zadd(db, key, &members)?)
            }
            Command::ZScore { key, member } => CommandResult::value(
                self.zscore(db, key, member)?
                    .map(|score| Bytes::from(format_score(score))),
            ),
            Command::ZCard { key } => CommandResult::from_count(self.zcard(db, key)?),
            Command::ZRange {
                key,
                start,
                stop,
                with_scores,
            } => {
                let entries = self.zrange(db, key, *start, *stop)?;
                let mut items = Vec::with_capacity(entries.len() * 2);
                for (member, score) in entries {
                    items.push(member);
                    if *with_scores {
                        items.push(Bytes::from(format_score(score)));
                    }
                }
                CommandResult::array(items)
            }
            Command::ZRem { key, members } => {
                CommandResult::from_count(self.zrem(db, key, &as_slices(members))?)
            }
        };
        Ok(result)
    }

    /// Parse `(name, args)` through the command table and execute it
    fn execute_args(&self, db: usize, name: &[u8], args: &[Bytes]) -> StoreResult<CommandResult> {
        let cmd = Command::parse(name, args)?;
        self.execute(db, &cmd)
    }
}
