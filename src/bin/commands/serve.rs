use clap::Args;
use rdapbot::database::{KvStore, MemoryKvStore, SqliteKvStore};
use rdapbot::server::start_server;
use rdapbot::BotConfig;
use std::sync::Arc;
use tracing::info;

/// Arguments for the Serve command
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind to (overrides configuration)
    #[clap(short, long)]
    pub address: Option<String>,

    /// Port to listen on (overrides configuration)
    #[clap(short, long)]
    pub port: Option<u16>,

    /// Keep caches in memory only; nothing is written to the data directory
    #[clap(long)]
    pub ephemeral: bool,
}

pub fn run(mut config: BotConfig, args: ServeArgs) {
    let ServeArgs {
        address,
        port,
        ephemeral,
    } = args;

    if let Some(address) = address {
        config.listen_address = address;
    }
    if let Some(port) = port {
        config.listen_port = port;
    }

    let store: Arc<dyn KvStore> = if ephemeral {
        info!("using in-memory caches");
        Arc::new(MemoryKvStore::new())
    } else {
        match SqliteKvStore::open_in_dir(&config.data_dir) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                eprintln!("Failed to open cache database: {}", e);
                std::process::exit(1);
            }
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(start_server(config, store)) {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
