//! HTTP transport for RDAP lookups

use super::types::RdapError;
use std::time::Duration;
use ureq::ResponseExt;

/// What the lens needs to know about an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
    /// Host that finally answered, after redirects
    pub host: Option<String>,
}

/// Blocking HTTP GET used by [`super::RdapLens`]
///
/// Non-2xx statuses are replies, not errors. Errors are reserved for
/// failures to get any response at all.
pub trait RdapTransport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpReply, RdapError>;
}

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl RdapTransport for UreqTransport {
    fn get(&self, url: &str) -> Result<HttpReply, RdapError> {
        let mut resp = self
            .agent
            .get(url)
            .header("Accept", "application/rdap+json")
            .header(
                "User-Agent",
                concat!("rdapbot/", env!("CARGO_PKG_VERSION")),
            )
            .call()
            .map_err(|e| RdapError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let host = resp.get_uri().host().map(str::to_string);
        let body = if status == 200 {
            resp.body_mut()
                .read_to_string()
                .map_err(|e| RdapError::Transport(e.to_string()))?
        } else {
            String::new()
        };

        Ok(HttpReply { status, body, host })
    }
}
