//! redleaf - Redis data types on an embedded ordered key-value store
//!
//! Opens the 16 databases and runs one command given on the command line,
//! or one command per line read from stdin.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use storage::{DiskStore, KvBackend, MemoryBackend, RocksBackend};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use redleaf::config::{Config, Engine};
use redleaf::format::{format_error, format_result};
use redleaf::session::Session;

/// redleaf command-line configuration
#[derive(Parser, Debug)]
#[command(name = "redleaf")]
#[command(about = "redleaf - Redis data types on an embedded ordered key-value store")]
struct Args {
    /// Configuration file path (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data storage directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Store engine
    #[arg(short, long, value_enum)]
    engine: Option<Engine>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,

    /// Database selected at start
    #[arg(short = 'n', long, default_value = "0")]
    db: usize,

    /// Command to run; reads commands from stdin when empty
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration from file if specified, otherwise use defaults
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?,
        None => Config::default(),
    };

    // Override config with command line arguments
    if let Some(data_dir) = &args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    if let Some(engine) = args.engine {
        config.storage.engine = engine;
    }
    if let Some(level) = &args.log_level {
        config.log.level = level.clone();
    }

    // Initialize logging
    let level = match config.log.level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Data directory: {}", config.storage.data_dir.display());
    info!("Engine: {:?}", config.storage.engine);

    match config.storage.engine {
        Engine::Rocksdb => run::<RocksBackend>(&config, &args),
        Engine::Memory => run::<MemoryBackend>(&config, &args),
    }
}

fn run<B: KvBackend>(config: &Config, args: &Args) -> anyhow::Result<()> {
    let store = DiskStore::<B>::open(&config.storage.data_dir)
        .with_context(|| format!("failed to open {}", config.storage.data_dir.display()))?;
    let mut session = Session::new(&store, args.db)?;

    if !args.command.is_empty() {
        let argv: Vec<Bytes> = args.command.iter().cloned().map(Bytes::from).collect();
        match session.execute(&argv) {
            Ok(result) => println!("{}", format_result(&result)),
            Err(e) => {
                println!("{}", format_error(&e));
                // close the databases before exiting
                drop(session);
                drop(store);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if let Some(reply) = session.execute_line(&line) {
            writeln!(stdout, "{}", reply)?;
            stdout.flush()?;
        }
    }

    info!("Input closed, shutting down");
    Ok(())
}
