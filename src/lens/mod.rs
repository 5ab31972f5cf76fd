//! Lens module
//!
//! Lenses combine lookup logic with output formatting and are shared by the
//! interaction server and the command line.
//!
//! | Lens | Purpose | Dependencies |
//! |------|---------|--------------|
//! | `RdapLens` | RDAP lookup, normalization and report rendering | ureq, serde_json |
//! | `WhoisClient` | Plain-text WHOIS fallback over TCP port 43 | (std only) |
//!
//! # Usage
//!
//! ```rust,ignore
//! use rdapbot::lens::rdap::{render, RdapLens, RdapView, RenderOutcome};
//! use rdapbot::lens::whois::{TcpWhoisClient, WhoisClient};
//!
//! let result = lens.fetch("8.8.8.8");
//! if let Some(record) = result.record() {
//!     let view = RdapView::initial_for(record);
//!     let outcome = render(&result, view, 1, "Data fetched from rdap.arin.net");
//! } else {
//!     let text = TcpWhoisClient::default().query("8.8.8.8")?;
//! }
//! ```

pub mod utils;

// RdapLens - RDAP lookup and report rendering
pub mod rdap;

// WHOIS fallback client
pub mod whois;
