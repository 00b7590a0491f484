//! Scripting bridge against a live store

use bytes::Bytes;
use storage::script::PCALL_ERROR_PREFIX;
use storage::{CommandResult, DiskStore, MemoryBackend, ScriptBridge, ScriptError, StoreError};
use tempfile::TempDir;

fn args(items: &[&str]) -> Vec<Bytes> {
    items.iter().map(|s| Bytes::from(s.to_string())).collect()
}

#[test]
fn bridge_reaches_every_type() {
    let dir = TempDir::new().unwrap();
    let store = DiskStore::<MemoryBackend>::open(dir.path()).unwrap();
    let bridge = ScriptBridge::new(&store, 3);

    bridge.call(b"set", &args(&["s", "v"])).unwrap();
    bridge.call(b"sadd", &args(&["set", "a", "b"])).unwrap();
    bridge.call(b"hset", &args(&["h", "f", "v"])).unwrap();
    bridge.call(b"zadd", &args(&["z", "1", "m"])).unwrap();

    assert_eq!(
        bridge.call(b"dbsize", &[]).unwrap(),
        CommandResult::Integer(4)
    );
    assert_eq!(
        bridge.call(b"zrange", &args(&["z", "0", "-1"])).unwrap(),
        CommandResult::Array(args(&["m"]))
    );
}

#[test]
fn call_raises_and_pcall_returns_errors() {
    let dir = TempDir::new().unwrap();
    let store = DiskStore::<MemoryBackend>::open(dir.path()).unwrap();
    let bridge = ScriptBridge::new(&store, 0);
    bridge.call(b"set", &args(&["s", "abc"])).unwrap();

    assert_eq!(
        bridge.call(b"incr", &args(&["s"])),
        Err(ScriptError::Command(StoreError::NotANumber))
    );
    assert_eq!(
        bridge.call(b"get", &[]),
        Err(ScriptError::Command(StoreError::WrongArity("GET".to_string())))
    );

    match bridge.pcall(b"incr", &args(&["s"])) {
        CommandResult::Error(msg) => {
            assert_eq!(
                msg,
                "ERR Error running script: ERR value is not an integer or out of range"
            );
            assert!(msg.starts_with(PCALL_ERROR_PREFIX));
        }
        other => panic!("expected error value, got {:?}", other),
    }
}

#[test]
fn unknown_commands_are_distinguished() {
    let dir = TempDir::new().unwrap();
    let store = DiskStore::<MemoryBackend>::open(dir.path()).unwrap();
    let bridge = ScriptBridge::new(&store, 0);

    assert!(matches!(
        bridge.call(b"flushdbx", &[]),
        Err(ScriptError::UnknownCommand(_))
    ));
    assert_eq!(
        bridge.pcall(b"eval", &[]),
        CommandResult::Error(format!(
            "{}@user_script: Unknown Redis command called from script",
            PCALL_ERROR_PREFIX
        ))
    );
}
