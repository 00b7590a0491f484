use redleaf::config::{Config, Engine};
use redleaf::Session;
use storage::{DiskStore, RocksBackend};
use tempfile::TempDir;

#[test]
fn session_runs_against_configured_directory() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("redleaf.yaml");
    let yaml = format!(
        "storage:\n  data_dir: {}\n  engine: rocksdb\n",
        dir.path().join("data").display()
    );
    std::fs::write(&config_path, yaml).unwrap();

    let config = Config::from_file(&config_path).unwrap();
    assert_eq!(config.storage.engine, Engine::Rocksdb);

    {
        let store = DiskStore::<RocksBackend>::open(&config.storage.data_dir).unwrap();
        let mut session = Session::new(&store, 0).unwrap();
        assert_eq!(session.execute_line("sadd s a b a").unwrap(), "(integer) 2");
        assert_eq!(session.execute_line("select 5").unwrap(), "OK");
        assert_eq!(session.execute_line("incrby n 41").unwrap(), "(integer) 41");
        assert_eq!(session.execute_line("save").unwrap(), "OK");
    }

    let store = DiskStore::<RocksBackend>::open(&config.storage.data_dir).unwrap();
    let mut session = Session::new(&store, 5).unwrap();
    assert_eq!(session.execute_line("incr n").unwrap(), "(integer) 42");
    assert_eq!(session.execute_line("type n").unwrap(), "string");
    assert_eq!(session.execute_line("select 0").unwrap(), "OK");
    assert_eq!(session.execute_line("scard s").unwrap(), "(integer) 2");

    let snapshots = config.storage.data_dir.join("snapshots");
    assert_eq!(std::fs::read_dir(snapshots).unwrap().count(), 1);
}
