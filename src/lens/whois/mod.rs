//! Legacy WHOIS fallback
//!
//! Used only when an RDAP lookup fails. Sends the query to a WHOIS server on
//! TCP port 43 and returns the plain-text answer.

use anyhow::{anyhow, Result};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_WHOIS_SERVER: &str = "whois.iana.org";
pub const WHOIS_PORT: u16 = 43;
pub const WHOIS_FILE_NAME: &str = "Whois_Response.txt";

/// Server answers that mean "nothing found"
const EMPTY_MARKERS: [&str; 2] = ["This query returned 0 objects", "Error: Invalid query"];

pub trait WhoisClient: Send + Sync {
    /// Raw WHOIS text for a query; `None` when the server found nothing
    fn query(&self, query: &str) -> Result<Option<String>>;
}

/// `None` for answers the server uses to report no match
pub fn filter_response(response: String) -> Option<String> {
    if response.trim().is_empty() || EMPTY_MARKERS.iter().any(|m| response.contains(m)) {
        None
    } else {
        Some(response)
    }
}

pub struct TcpWhoisClient {
    server: String,
    port: u16,
    timeout: Duration,
}

impl TcpWhoisClient {
    pub fn new(server: &str) -> Self {
        Self {
            server: server.to_string(),
            port: WHOIS_PORT,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for TcpWhoisClient {
    fn default() -> Self {
        Self::new(DEFAULT_WHOIS_SERVER)
    }
}

impl WhoisClient for TcpWhoisClient {
    fn query(&self, query: &str) -> Result<Option<String>> {
        let addr = (self.server.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| anyhow!("Failed to resolve {}: {}", self.server, e))?
            .next()
            .ok_or_else(|| anyhow!("No address for {}", self.server))?;

        let mut stream = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| anyhow!("Failed to connect to {}: {}", self.server, e))?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        stream
            .write_all(format!("{}\r\n", query.trim()).as_bytes())
            .map_err(|e| anyhow!("Failed to send WHOIS query: {}", e))?;

        let mut buf = Vec::new();
        stream
            .read_to_end(&mut buf)
            .map_err(|e| anyhow!("Failed to read WHOIS response: {}", e))?;
        debug!("whois {} returned {} bytes from {}", query, buf.len(), self.server);

        Ok(filter_response(String::from_utf8_lossy(&buf).into_owned()))
    }
}
