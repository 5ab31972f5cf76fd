use clap::Args;
use rdapbot::database::{DatabaseConn, SchemaManager, SchemaStatus, SqliteKvStore, SCHEMA_VERSION};
use rdapbot::lens::utils::OutputFormat;
use rdapbot::BotConfig;
use serde::Serialize;
use std::path::Path;

/// Arguments for the Config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Delete expired cache and session entries from the store
    #[clap(long)]
    pub purge: bool,
}

#[derive(Debug, Serialize)]
struct ConfigInfo {
    config_file: String,
    data_dir: String,
    listen_address: String,
    bot_token_set: bool,
    public_key_set: bool,
    rdap_domain_endpoint: String,
    rdap_ip_endpoint: String,
    whois_server: String,
    lookup_cache_ttl_secs: u64,
    session_ttl_secs: u64,
    store: StoreInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    purged: Option<usize>,
}

#[derive(Debug, Serialize)]
struct StoreInfo {
    path: String,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    schema_initialized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema_version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entries: Option<u64>,
}

pub fn run(config: &BotConfig, args: ConfigArgs, output_format: OutputFormat) {
    let ConfigArgs { purge } = args;

    let purged = if purge {
        match SqliteKvStore::open_in_dir(&config.data_dir).and_then(|s| s.purge_expired()) {
            Ok(count) => Some(count),
            Err(e) => {
                eprintln!("Failed to purge expired entries: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    let info = ConfigInfo {
        config_file: BotConfig::config_file_path(),
        data_dir: config.data_dir.clone(),
        listen_address: config.listen_addr(),
        bot_token_set: config.bot_token.is_some(),
        public_key_set: config.public_key.is_some(),
        rdap_domain_endpoint: config.rdap_domain_endpoint.clone(),
        rdap_ip_endpoint: config.rdap_ip_endpoint.clone(),
        whois_server: config.whois_server.clone(),
        lookup_cache_ttl_secs: config.lookup_cache_ttl_secs,
        session_ttl_secs: config.session_ttl_secs,
        store: store_info(&config.sqlite_path()),
        purged,
    };

    match output_format {
        OutputFormat::Json => match serde_json::to_string(&info) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing config: {}", e),
        },
        OutputFormat::JsonPretty => match serde_json::to_string_pretty(&info) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing config: {}", e),
        },
        OutputFormat::Table | OutputFormat::Markdown => {
            println!("Configuration:");
            println!("  Config file:        {}", info.config_file);
            for line in config.summary().lines() {
                println!("  {}", line);
            }
            println!();
            println!("Store:");
            println!(
                "  Exists:             {}",
                if info.store.exists { "yes" } else { "no" }
            );
            if let Some(size) = info.store.size_bytes {
                println!("  Size:               {} bytes", size);
            }
            match info.store.schema_version {
                Some(v) => println!("  Schema version:     {} (binary: {})", v, SCHEMA_VERSION),
                None => println!("  Schema version:     not initialized"),
            }
            if let Some(entries) = info.store.entries {
                println!("  Entries:            {}", entries);
            }
            if let Some(count) = info.purged {
                println!("  Purged:             {} expired entries", count);
            }
        }
    }
}

fn store_info(sqlite_path: &str) -> StoreInfo {
    let exists = Path::new(sqlite_path).exists();
    let mut info = StoreInfo {
        path: sqlite_path.to_string(),
        exists,
        size_bytes: None,
        schema_initialized: false,
        schema_version: None,
        entries: None,
    };
    if !exists {
        return info;
    }

    info.size_bytes = std::fs::metadata(sqlite_path).ok().map(|m| m.len());
    let Ok(db) = DatabaseConn::open_path(sqlite_path) else {
        return info;
    };

    match SchemaManager::new(&db.conn).check_status() {
        Ok(SchemaStatus::Current) => {
            info.schema_initialized = true;
            info.schema_version = Some(SCHEMA_VERSION);
            info.entries = db.table_count("kv_entries").ok();
        }
        Ok(SchemaStatus::Incompatible {
            database_version, ..
        }) => {
            info.schema_initialized = true;
            info.schema_version = Some(database_version);
        }
        Ok(SchemaStatus::NotInitialized) | Err(_) => {}
    }
    info
}
