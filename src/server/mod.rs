//! Interaction server for rdapbot
//!
//! This module provides the HTTP endpoint the chat platform posts interactions
//! to, and everything needed to answer them.
//!
//! # Architecture
//!
//! The server is organized into several submodules:
//!
//! - `protocol` - Inbound interaction and immediate callback types
//! - `verify` - Ed25519 request signature verification
//! - `platform` - Outbound webhook calls (edit original, follow-ups)
//! - `handler` - Handler trait, context and error type
//! - `router` - Command/component registry and the dispatcher
//! - `handlers` - Individual command and component handlers
//!
//! # Request lifecycle
//!
//! 1. The signature headers are checked against the raw body (401 on failure).
//! 2. The body is parsed as an interaction (400 if malformed).
//! 3. The dispatcher answers immediately: PONG, an ephemeral rejection, or a
//!    deferred acknowledgement.
//! 4. For deferred interactions the handler runs in the background and its
//!    reply is delivered through the platform client.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rdapbot::server::start_server;
//! use rdapbot::database::MemoryKvStore;
//!
//! let config = BotConfig::new(&None)?;
//! start_server(config, Arc::new(MemoryKvStore::new())).await?;
//! ```

pub mod handler;
pub mod handlers;
pub mod platform;
pub mod protocol;
pub mod router;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use handler::{BotContext, BotError, BotResult, ErrorCode, HandlerKind, InteractionMethod, Reply};
pub use platform::{DiscordClient, PlatformClient, PlatformError};
pub use protocol::{CallbackType, Interaction, InteractionResponse, InteractionType};
pub use router::{Dispatched, Dispatcher, Router};
pub use verify::{Ed25519Verifier, InteractionVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

use crate::config::BotConfig;
use crate::database::KvStore;
use anyhow::anyhow;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router as AxumRouter,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Where requests to unknown paths are sent
pub const PROJECT_URL: &str = "https://github.com/User9684/user-utils";

// =============================================================================
// Router Creation
// =============================================================================

/// Create a router with all handlers registered
pub fn create_router() -> Router {
    use handlers::*;

    let mut router = Router::new();

    // Commands
    router.register::<WhoisCommand>();

    // Report components
    router.register::<WhoisSelectHandler>();
    router.register::<WhoisNextHandler>();
    router.register::<WhoisPreviousHandler>();

    router
}

// =============================================================================
// Server State
// =============================================================================

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    /// Dispatcher for routing interactions
    pub dispatcher: Arc<Dispatcher>,

    /// Checks request signatures
    pub verifier: Arc<dyn InteractionVerifier>,
}

// =============================================================================
// Axum Router Creation
// =============================================================================

/// Create the Axum router for the interaction endpoint
pub fn create_axum_router(state: ServerState) -> AxumRouter {
    AxumRouter::new()
        .route("/interactions", post(interactions_handler))
        .route("/health", get(health_handler))
        .fallback(redirect_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler() -> &'static str {
    "OK"
}

/// Anything else goes to the project page
async fn redirect_handler() -> Response {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, PROJECT_URL)],
    )
        .into_response()
}

/// Verify, parse and dispatch one interaction
async fn interactions_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = uuid::Uuid::new_v4();

    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let timestamp = headers.get(TIMESTAMP_HEADER).and_then(|v| v.to_str().ok());
    let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
        debug!(%request_id, "rejecting unsigned request");
        return (StatusCode::UNAUTHORIZED, "missing request signature").into_response();
    };

    if !state.verifier.verify(signature, timestamp, &body) {
        warn!(%request_id, "rejecting request with bad signature");
        return (StatusCode::UNAUTHORIZED, "invalid request signature").into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            warn!(%request_id, "malformed interaction: {}", e);
            return (StatusCode::BAD_REQUEST, format!("malformed interaction: {}", e))
                .into_response();
        }
    };

    debug!(%request_id, interaction = %interaction.id, "dispatching");
    let dispatched = state.dispatcher.dispatch(interaction);
    Json(dispatched.response).into_response()
}

// =============================================================================
// Server Startup
// =============================================================================

/// Start the interaction server
///
/// Requires `bot_token` and `public_key` to be configured.
pub async fn start_server(config: BotConfig, store: Arc<dyn KvStore>) -> anyhow::Result<()> {
    let public_key = config
        .public_key
        .as_deref()
        .ok_or_else(|| anyhow!("public_key is not configured (set RDAPBOT_PUBLIC_KEY)"))?;
    let verifier = Ed25519Verifier::from_hex(public_key)?;

    let bind_address = config.listen_addr();
    let context = BotContext::from_config(config, store)?;
    let dispatcher = Dispatcher::new(create_router(), context);

    let state = ServerState {
        dispatcher: Arc::new(dispatcher),
        verifier: Arc::new(verifier),
    };

    let app = create_axum_router(state);

    info!("Starting interaction server on {}", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
