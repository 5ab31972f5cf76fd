#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! rdapbot - RDAP lookups as interactive chat reports
//!
//! rdapbot answers a `/whois` slash command by looking a domain name or IP
//! address up over RDAP and replying with a report the user can navigate:
//! a select menu switches between views (name servers, IP info, events,
//! entities, raw response) and buttons page through the entities tree. When
//! RDAP has nothing, the query falls back to legacy WHOIS.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (core) | Lookup, normalization, rendering, storage | `ureq`, `rusqlite`, `serde_json` |
//! | `server` | Interaction endpoint and platform client | `axum`, `tokio`, `reqwest`, `ed25519-dalek` |
//! | `cli` | The `rdapbot` binary | All above + `clap`, `tabled` |
//!
//! # Architecture
//!
//! - **[`config`]**: Configuration from file, environment and `.env`
//! - **[`database`]**: Expiring key-value store, sessions and the lookup cache
//! - **[`lens`]**: RDAP fetch, normalization, flattening and rendering;
//!   the WHOIS fallback
//! - **[`message`]**: Embeds, components and messages as sent on the wire
//! - **`server`**: Signed interaction endpoint, dispatcher and handlers
//!   (requires `server`)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use rdapbot::database::MemoryKvStore;
//! use rdapbot::lens::rdap::{render, RdapLens, RdapView, RenderOutcome};
//! use rdapbot::BotConfig;
//! use std::sync::Arc;
//!
//! let config = BotConfig::new(&None)?;
//! let lens = RdapLens::from_config(&config, Arc::new(MemoryKvStore::new()));
//!
//! let result = lens.fetch("example.com");
//! if let Some(record) = result.record() {
//!     let view = RdapView::initial_for(record);
//!     if let RenderOutcome::Report(report) = render(&result, view, 1, "Data fetched from rdap.org") {
//!         println!("{}", serde_json::to_string_pretty(&report.embeds)?);
//!     }
//! }
//! ```

pub mod config;
pub mod database;
pub mod lens;
pub mod message;

// Server module - requires the server feature
#[cfg(feature = "server")]
pub mod server;

// =============================================================================
// Configuration (always available)
// =============================================================================

pub use config::BotConfig;

// =============================================================================
// Database Module - Re-export commonly used types
// =============================================================================

pub use database::{
    KvStore, MemoryKvStore, RdapCache, Session, SessionStore, SqliteKvStore,
};

// =============================================================================
// Lens Module
// =============================================================================

pub use lens::rdap::{RdapFetchResult, RdapLens, RdapRecord, RdapView};
pub use lens::utils::OutputFormat;

// =============================================================================
// Server Module - requires "server" feature
// =============================================================================

#[cfg(feature = "server")]
pub use server::{create_router, start_server, BotContext, Dispatcher, Router, ServerState};
