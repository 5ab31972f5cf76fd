//! RDAP lookup lens
//!
//! Resolves a free-form query (domain name or IP address) to a normalized
//! [`RdapRecord`], trying the domain endpoint first and the IP endpoint second.
//! Successful raw responses are cached by query so a report can be re-rendered
//! without hitting the network again.
//!
//! # Example
//!
//! ```rust,ignore
//! use rdapbot::lens::rdap::{RdapLens, RdapView};
//!
//! let lens = RdapLens::from_config(&config, store);
//! let result = lens.fetch("example.com");
//! if let Some(record) = result.record() {
//!     println!("{}", record.object_class());
//! }
//! ```

pub mod flatten;
pub mod normalize;
pub mod render;
pub mod transport;
pub mod types;

pub use flatten::{flatten, Page};
pub use normalize::{normalize, normalize_value};
pub use render::{
    menu_options, parse_page_field, render, RdapView, RenderOutcome, RenderedReport,
    NEXT_BUTTON_ID, PAGE_FIELD_NAME, PREVIOUS_BUTTON_ID, RAW_FILE_NAME, REPORT_TITLE,
    SELECT_MENU_ID,
};
pub use transport::{HttpReply, RdapTransport, UreqTransport};
pub use types::*;

use crate::config::BotConfig;
use crate::database::{KvStore, RdapCache};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Source label for responses served from the lookup cache
pub const CACHE_SOURCE: &str = "RDAP Cache";

/// Error text when neither endpoint returned a usable response
pub const NO_RESPONSE: &str = "RDAP server did not respond.";

pub const DEFAULT_DOMAIN_ENDPOINT: &str = "https://rdap.org/domain/";
pub const DEFAULT_IP_ENDPOINT: &str = "https://rdap.org/ip/";

/// Canonical form of a lookup query: lowercase with all whitespace removed
pub fn normalize_query(query: &str) -> String {
    query
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// =============================================================================
// Fetch result
// =============================================================================

/// Outcome of a lookup
///
/// `source` is present only on success and names where the data came from:
/// [`CACHE_SOURCE`] or the host of the answering server.
#[derive(Debug, Clone, PartialEq)]
pub struct RdapFetchResult {
    pub outcome: Result<RdapRecord, String>,
    pub source: Option<String>,
}

impl RdapFetchResult {
    pub fn success(record: RdapRecord, source: impl Into<String>) -> Self {
        Self {
            outcome: Ok(record),
            source: Some(source.into()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            outcome: Err(error.into()),
            source: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn record(&self) -> Option<&RdapRecord> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}

// =============================================================================
// Lens
// =============================================================================

/// RDAP endpoints the lens queries, as URL prefixes the query is appended to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdapEndpoints {
    pub domain: String,
    pub ip: String,
}

impl Default for RdapEndpoints {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN_ENDPOINT.to_string(),
            ip: DEFAULT_IP_ENDPOINT.to_string(),
        }
    }
}

pub struct RdapLens {
    transport: Arc<dyn RdapTransport>,
    cache: RdapCache,
    endpoints: RdapEndpoints,
}

impl RdapLens {
    pub fn new(transport: Arc<dyn RdapTransport>, cache: RdapCache, endpoints: RdapEndpoints) -> Self {
        Self {
            transport,
            cache,
            endpoints,
        }
    }

    /// Build a lens with a real HTTP transport from configuration
    pub fn from_config(config: &BotConfig, store: Arc<dyn KvStore>) -> Self {
        Self::new(
            Arc::new(UreqTransport::new(config.http_timeout())),
            RdapCache::with_ttl(store, config.lookup_cache_ttl()),
            RdapEndpoints {
                domain: config.rdap_domain_endpoint.clone(),
                ip: config.rdap_ip_endpoint.clone(),
            },
        )
    }

    /// Look up a query, consulting the cache first
    ///
    /// Never panics and never returns an error: every failure is reported in
    /// the result with human-readable text.
    pub fn fetch(&self, query: &str) -> RdapFetchResult {
        let query = normalize_query(query);
        if query.is_empty() {
            return RdapFetchResult::failure("No query given.");
        }

        match self.cache.get(&query) {
            Ok(Some(raw)) => {
                debug!("rdap cache hit for {}", query);
                return match normalize(&raw) {
                    Ok(record) => RdapFetchResult::success(record, CACHE_SOURCE),
                    Err(e) => RdapFetchResult::failure(e.to_string()),
                };
            }
            Ok(None) => {}
            Err(e) => warn!("{}", RdapError::Store(format!("read {}: {}", query, e))),
        }

        for endpoint in [&self.endpoints.domain, &self.endpoints.ip] {
            let url = format!("{}{}", endpoint, query);
            match self.transport.get(&url) {
                Ok(reply) if reply.status == 200 => return self.accept(&query, reply),
                Ok(reply) => debug!("{} answered {}", url, reply.status),
                Err(e) => {
                    warn!("rdap request to {} failed: {}", url, e);
                    return RdapFetchResult::failure(e.to_string());
                }
            }
        }

        RdapFetchResult::failure(NO_RESPONSE)
    }

    fn accept(&self, query: &str, reply: HttpReply) -> RdapFetchResult {
        let record = match normalize(&reply.body) {
            Ok(record) => record,
            Err(e) => return RdapFetchResult::failure(e.to_string()),
        };

        if let Err(e) = self.cache.put(query, &reply.body) {
            warn!("{}", RdapError::Store(format!("write {}: {}", query, e)));
        }

        let source = reply.host.unwrap_or_else(|| "unknown".to_string());
        info!("rdap {} resolved by {}", query, source);
        RdapFetchResult::success(record, source)
    }
}
