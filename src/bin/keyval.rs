//! keyval CLI
//!
//! Replays the WAL, runs one command against the store, and waits for the
//! WAL writer to drain before exiting.

use clap::{Parser, Subcommand, ValueEnum};
use keyval::config::WalSyncStrategy;
use keyval::wal::{collect_events, Backend};
use keyval::{BackendKind, Config, Engine, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// keyval CLI
#[derive(Parser, Debug)]
#[command(name = "keyval")]
#[command(about = "Key-value store with a replayable write-ahead log")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./keyval_data")]
    data_dir: String,

    /// WAL backend
    #[arg(short, long, value_enum, default_value_t = BackendArg::Sqlite)]
    backend: BackendArg,

    /// Capacity of the WAL writer queue
    #[arg(short, long, default_value_t = Config::DEFAULT_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// fsync the file WAL every N entries instead of every write
    #[arg(long)]
    sync_every: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    File,
    Sqlite,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::File => BackendKind::File,
            BackendArg::Sqlite => BackendKind::Sqlite,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },

    /// Print every key-value pair after replay
    Dump,

    /// Print the raw WAL events
    Events,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,keyval=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let sync_strategy = match args.sync_every {
        Some(count) => WalSyncStrategy::EveryNEntries { count },
        None => WalSyncStrategy::EveryWrite,
    };

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .backend(args.backend.into())
        .queue_capacity(args.queue_capacity)
        .wal_sync_strategy(sync_strategy)
        .build();

    if let Commands::Events = args.command {
        return print_events(&config);
    }

    let engine = Engine::open(config)?;

    match args.command {
        Commands::Get { key } => println!("{}", engine.get(&key)?),
        Commands::Put { key, value } => {
            engine.put(&key, &value)?;
            println!("put: {} - {}", key, value);
        }
        Commands::Delete { key } => {
            engine.delete(&key)?;
            println!("deleted: {}", key);
        }
        Commands::Dump => {
            for (key, value) in engine.store().snapshot() {
                println!("{}\t{}", key, value);
            }
        }
        Commands::Events => {}
    }

    engine.close()
}

fn print_events(config: &Config) -> Result<()> {
    config.validate()?;
    std::fs::create_dir_all(&config.data_dir)?;

    let mut backend = Backend::open(config)?;
    for event in collect_events(&mut backend)? {
        println!("{}\t{}\t{}\t{}", event.id, event.kind, event.key, event.value);
    }
    Ok(())
}
