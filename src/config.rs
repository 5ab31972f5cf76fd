use crate::lens::rdap::{DEFAULT_DOMAIN_ENDPOINT, DEFAULT_IP_ENDPOINT};
use crate::lens::whois::DEFAULT_WHOIS_SERVER;
use anyhow::{anyhow, Result};
use config::Config;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// Directory holding the key-value store
    pub data_dir: String,

    /// Address and port the interaction endpoint binds to
    pub listen_address: String,
    pub listen_port: u16,

    /// Bot token used for outbound platform calls
    pub bot_token: Option<String>,

    /// Hex-encoded Ed25519 application public key
    pub public_key: Option<String>,

    /// User id that receives error details on failed commands
    pub bot_owner: Option<String>,

    /// RDAP URL prefixes the query is appended to
    pub rdap_domain_endpoint: String,
    pub rdap_ip_endpoint: String,

    /// Host queried on port 43 when RDAP fails
    pub whois_server: String,

    /// TTL for cached RDAP responses in seconds (default: 8 minutes)
    pub lookup_cache_ttl_secs: u64,

    /// TTL for interaction sessions in seconds (default: 8 minutes)
    pub session_ttl_secs: u64,

    /// Timeout for outbound RDAP, WHOIS and platform calls
    pub http_timeout_secs: u64,

    /// Log every incoming interaction
    pub interaction_debug: bool,
}

const EMPTY_CONFIG: &str = r#"### rdapbot configuration file

### directory for the session and lookup cache database
# data_dir = "~/.rdapbot"

### interaction endpoint
# listen_address = "127.0.0.1"
# listen_port = 8787

### platform credentials (prefer RDAPBOT_BOT_TOKEN in the environment)
# bot_token = ""
# public_key = ""
# bot_owner = ""

### lookup sources
# rdap_domain_endpoint = "https://rdap.org/domain/"
# rdap_ip_endpoint = "https://rdap.org/ip/"
# whois_server = "whois.iana.org"

### cache TTL settings (in seconds)
# lookup_cache_ttl_secs = 480
# session_ttl_secs = 480
# http_timeout_secs = 10

### log every incoming interaction
# interaction_debug = false
"#;

const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1";
const DEFAULT_LISTEN_PORT: u16 = 8787;
const DEFAULT_CACHE_TTL_SECS: u64 = 480;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

fn home_dir() -> String {
    dirs::home_dir()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string())
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            data_dir: format!("{}/.rdapbot", home_dir()),
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            bot_token: None,
            public_key: None,
            bot_owner: None,
            rdap_domain_endpoint: DEFAULT_DOMAIN_ENDPOINT.to_string(),
            rdap_ip_endpoint: DEFAULT_IP_ENDPOINT.to_string(),
            whois_server: DEFAULT_WHOIS_SERVER.to_string(),
            lookup_cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            session_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            interaction_debug: false,
        }
    }
}

impl BotConfig {
    /// Function to create and initialize a new configuration
    pub fn new(path: &Option<String>) -> Result<BotConfig> {
        // .env is optional; real environment variables take precedence
        let _ = dotenvy::dotenv();

        let mut builder = Config::builder();

        // Config dir
        let rdapbot_dir = format!("{}/.rdapbot", home_dir());

        // Add in toml configuration file
        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                std::fs::create_dir_all(rdapbot_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create rdapbot directory: {}", e))?;
                let p = format!("{}/rdapbot.toml", rdapbot_dir.as_str());
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // Add in settings from the environment (with a prefix of RDAPBOT)
        // E.g., `RDAPBOT_BOT_TOKEN=... ./rdapbot serve` would set the bot token
        builder = builder.add_source(config::Environment::with_prefix("RDAPBOT"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_map(&config)
    }

    /// Build a configuration from flat string settings, defaulting missing keys
    pub fn from_map(config: &HashMap<String, String>) -> Result<BotConfig> {
        let defaults = BotConfig::default();

        let string = |key: &str, default: String| {
            config
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or(default)
        };
        let optional = |key: &str| config.get(key).filter(|v| !v.is_empty()).cloned();
        let number = |key: &str, default: u64| -> Result<u64> {
            match config.get(key) {
                Some(v) => v
                    .parse()
                    .map_err(|e| anyhow!("Invalid value for {}: '{}' ({})", key, v, e)),
                None => Ok(default),
            }
        };

        let listen_port = match config.get("listen_port") {
            Some(v) => v
                .parse()
                .map_err(|e| anyhow!("Invalid value for listen_port: '{}' ({})", v, e))?,
            None => defaults.listen_port,
        };

        let interaction_debug = match config.get("interaction_debug").map(|v| v.to_lowercase()) {
            Some(v) => matches!(v.as_str(), "true" | "1" | "yes"),
            None => defaults.interaction_debug,
        };

        Ok(BotConfig {
            data_dir: string("data_dir", defaults.data_dir),
            listen_address: string("listen_address", defaults.listen_address),
            listen_port,
            bot_token: optional("bot_token"),
            public_key: optional("public_key"),
            bot_owner: optional("bot_owner"),
            rdap_domain_endpoint: string("rdap_domain_endpoint", defaults.rdap_domain_endpoint),
            rdap_ip_endpoint: string("rdap_ip_endpoint", defaults.rdap_ip_endpoint),
            whois_server: string("whois_server", defaults.whois_server),
            lookup_cache_ttl_secs: number("lookup_cache_ttl_secs", defaults.lookup_cache_ttl_secs)?,
            session_ttl_secs: number("session_ttl_secs", defaults.session_ttl_secs)?,
            http_timeout_secs: number("http_timeout_secs", defaults.http_timeout_secs)?,
            interaction_debug,
        })
    }

    /// Get the path to the key-value store database file
    pub fn sqlite_path(&self) -> String {
        let data_dir = self.data_dir.trim_end_matches('/');
        format!("{}/rdapbot-kv.sqlite3", data_dir)
    }

    pub fn lookup_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.lookup_cache_ttl_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_address, self.listen_port)
    }

    /// Display configuration summary; credentials are redacted
    pub fn summary(&self) -> String {
        let redact = |v: &Option<String>| match v {
            Some(_) => "(set)".to_string(),
            None => "(not set)".to_string(),
        };

        [
            format!("Data Directory:     {}", self.data_dir),
            format!("SQLite Path:        {}", self.sqlite_path()),
            format!("Listen Address:     {}", self.listen_addr()),
            format!("Bot Token:          {}", redact(&self.bot_token)),
            format!(
                "Public Key:         {}",
                self.public_key.as_deref().unwrap_or("(not set)")
            ),
            format!(
                "Bot Owner:          {}",
                self.bot_owner.as_deref().unwrap_or("(not set)")
            ),
            format!("RDAP Domain URL:    {}", self.rdap_domain_endpoint),
            format!("RDAP IP URL:        {}", self.rdap_ip_endpoint),
            format!("WHOIS Server:       {}", self.whois_server),
            format!("Lookup Cache TTL:   {} seconds", self.lookup_cache_ttl_secs),
            format!("Session TTL:        {} seconds", self.session_ttl_secs),
            format!("HTTP Timeout:       {} seconds", self.http_timeout_secs),
            format!("Interaction Debug:  {}", self.interaction_debug),
        ]
        .join("\n")
    }

    /// Get the config file path
    pub fn config_file_path() -> String {
        format!("{}/.rdapbot/rdapbot.toml", home_dir())
    }
}
