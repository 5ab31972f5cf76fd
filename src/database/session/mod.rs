//! Session-based storage
//!
//! This module provides storage for short-lived interaction sessions.
//!
//! Unlike the lookup cache, sessions are:
//! - Created once per command interaction
//! - Looked up (never mutated) by follow-up interactions on the same report
//! - Left to expire passively

mod session_store;

pub use session_store::{Session, SessionStore, DEFAULT_SESSION_TTL};
