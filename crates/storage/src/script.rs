//! Scripting bridge
//!
//! Lets an embedded script issue Redis commands against one database. Names
//! are resolved through the same command table as the main dispatcher, so a
//! script can only reach the commands listed there.

use crate::command::{self, Command, CommandResult};
use crate::traits::{RedisStore, StoreError};
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

/// Prefix of the error value produced by `pcall`
pub const PCALL_ERROR_PREFIX: &str = "ERR Error running script: ";

/// Failure raised into a script by `call`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("@user_script: Unknown Redis command called from script")]
    UnknownCommand(String),

    #[error("{0}")]
    Command(StoreError),
}

impl From<StoreError> for ScriptError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnknownCommand(name) => ScriptError::UnknownCommand(name),
            other => ScriptError::Command(other),
        }
    }
}

/// Command entry points exposed to a script
pub struct ScriptBridge<'a, S: RedisStore> {
    store: &'a S,
    db: usize,
}

impl<'a, S: RedisStore> ScriptBridge<'a, S> {
    pub fn new(store: &'a S, db: usize) -> Self {
        Self { store, db }
    }

    pub fn db(&self) -> usize {
        self.db
    }

    /// Run a command, raising any failure into the script
    pub fn call(&self, name: &[u8], args: &[Bytes]) -> Result<CommandResult, ScriptError> {
        if command::lookup(name).is_none() {
            return Err(ScriptError::UnknownCommand(
                String::from_utf8_lossy(name).into_owned(),
            ));
        }
        let cmd = Command::parse(name, args)?;
        debug!("script call {} on db {}", cmd.name(), self.db);
        Ok(self.store.execute(self.db, &cmd)?)
    }

    /// Run a command, turning any failure into an error value
    pub fn pcall(&self, name: &[u8], args: &[Bytes]) -> CommandResult {
        match self.call(name, args) {
            Ok(result) => result,
            Err(e) => CommandResult::error(format!("{}{}", PCALL_ERROR_PREFIX, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use crate::store::DiskStore;
    use tempfile::TempDir;

    fn args(items: &[&str]) -> Vec<Bytes> {
        items.iter().map(|s| Bytes::from(s.to_string())).collect()
    }

    #[test]
    fn test_call_and_pcall() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::<MemoryBackend>::open(dir.path()).unwrap();
        let bridge = ScriptBridge::new(&store, 2);

        assert_eq!(
            bridge.call(b"INCRBY", &args(&["n", "5"])),
            Ok(CommandResult::Integer(5))
        );
        assert_eq!(
            bridge.pcall(b"get", &args(&["n"])),
            CommandResult::Value(Some(Bytes::from("5")))
        );

        bridge.call(b"sadd", &args(&["s", "m"])).unwrap();
        assert_eq!(
            bridge.call(b"incr", &args(&["s"])),
            Err(ScriptError::Command(StoreError::WrongType))
        );
        assert_eq!(
            bridge.pcall(b"incr", &args(&["s"])),
            CommandResult::Error(format!("{}{}", PCALL_ERROR_PREFIX, StoreError::WrongType))
        );
    }

    #[test]
    fn test_unknown_command() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::<MemoryBackend>::open(dir.path()).unwrap();
        let bridge = ScriptBridge::new(&store, 0);

        let err = bridge.call(b"lpush", &args(&["l", "x"])).unwrap_err();
        assert_eq!(err, ScriptError::UnknownCommand("lpush".to_string()));
        assert_eq!(
            err.to_string(),
            "@user_script: Unknown Redis command called from script"
        );
        assert!(bridge.pcall(b"lpush", &[]).is_error());
    }
}
