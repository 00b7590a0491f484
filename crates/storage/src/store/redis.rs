//! Redis Store implementation for DiskStore

use super::DiskStore;
use crate::traits::{KvBackend, RedisStore};

// DiskStore uses the default execute dispatch from the trait
impl<B: KvBackend> RedisStore for DiskStore<B> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandResult;
    use crate::memory::MemoryBackend;
    use crate::traits::StoreError;
    use bytes::Bytes;
    use tempfile::TempDir;

    fn run(store: &DiskStore<MemoryBackend>, db: usize, line: &[&str]) -> CommandResult {
        let args: Vec<Bytes> = line[1..]
            .iter()
            .map(|arg| Bytes::from(arg.to_string()))
            .collect();
        store
            .execute_args(db, line[0].as_bytes(), &args)
            .unwrap()
    }

    fn array(items: &[&str]) -> CommandResult {
        CommandResult::Array(items.iter().map(|s| Bytes::from(s.to_string())).collect())
    }

    #[test]
    fn test_execute_replies() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::<MemoryBackend>::open(dir.path()).unwrap();

        assert_eq!(run(&store, 0, &["PING"]), CommandResult::Pong);
        assert_eq!(run(&store, 0, &["set", "k", "v"]), CommandResult::Ok);
        assert_eq!(
            run(&store, 0, &["get", "k"]),
            CommandResult::Value(Some(Bytes::from("v")))
        );
        assert_eq!(run(&store, 0, &["get", "nope"]), CommandResult::Value(None));
        assert_eq!(
            run(&store, 0, &["type", "k"]),
            CommandResult::Status("string".to_string())
        );
        assert_eq!(run(&store, 0, &["hset", "h", "f", "1"]), CommandResult::Integer(1));
        assert_eq!(run(&store, 0, &["hgetall", "h"]), array(&["f", "1"]));
        assert_eq!(
            run(&store, 0, &["zadd", "z", "1.5", "a", "-inf", "b"]),
            CommandResult::Integer(2)
        );
        assert_eq!(
            run(&store, 0, &["zrange", "z", "0", "-1", "WITHSCORES"]),
            array(&["b", "-inf", "a", "1.5"])
        );
        assert_eq!(
            run(&store, 0, &["zscore", "z", "a"]),
            CommandResult::Value(Some(Bytes::from("1.5")))
        );
        assert_eq!(run(&store, 0, &["dbsize"]), CommandResult::Integer(3));
        assert_eq!(run(&store, 1, &["dbsize"]), CommandResult::Integer(0));
    }

    #[test]
    fn test_execute_errors() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::<MemoryBackend>::open(dir.path()).unwrap();
        run(&store, 0, &["sadd", "s", "a"]);

        assert_eq!(
            store.execute_args(0, b"get", &[Bytes::from("s")]),
            Err(StoreError::WrongType)
        );
        assert_eq!(
            store.execute_args(16, b"dbsize", &[]),
            Err(StoreError::DatabaseOutOfRange(16))
        );
        assert!(matches!(
            store.execute_args(0, b"save", &[]),
            Err(StoreError::NotSupported(_))
        ));
    }
}
