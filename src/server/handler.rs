//! Handler trait and context module for interactions
//!
//! This module defines the `InteractionMethod` trait which every command and
//! component handler implements, along with the `BotContext` giving handlers
//! access to the lookup lens, the session store and the outbound clients.

use crate::config::BotConfig;
use crate::database::{KvStore, SessionStore};
use crate::lens::rdap::RdapLens;
use crate::lens::whois::{TcpWhoisClient, WhoisClient};
use crate::message::Message;
use crate::server::platform::{DiscordClient, PlatformClient};
use crate::server::protocol::Interaction;
use anyhow::anyhow;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

// =============================================================================
// Context
// =============================================================================

/// Shared resources handed to every handler
#[derive(Clone)]
pub struct BotContext {
    pub config: BotConfig,
    pub lens: Arc<RdapLens>,
    pub sessions: SessionStore,
    pub whois: Arc<dyn WhoisClient>,
    pub platform: Arc<dyn PlatformClient>,
}

impl BotContext {
    /// Build a context with real network clients
    ///
    /// Requires `bot_token` to be configured.
    pub fn from_config(config: BotConfig, store: Arc<dyn KvStore>) -> anyhow::Result<Self> {
        let token = config
            .bot_token
            .as_deref()
            .ok_or_else(|| anyhow!("bot_token is not configured (set RDAPBOT_BOT_TOKEN)"))?;
        let platform = DiscordClient::new(token, config.http_timeout())?;

        Ok(Self {
            lens: Arc::new(RdapLens::from_config(&config, store.clone())),
            sessions: SessionStore::with_ttl(store, config.session_ttl()),
            whois: Arc::new(
                TcpWhoisClient::new(&config.whois_server).with_timeout(config.http_timeout()),
            ),
            platform: Arc::new(platform),
            config,
        })
    }

    /// Whether a user id is the configured bot owner
    pub fn is_owner(&self, user_id: Option<&str>) -> bool {
        match (self.config.bot_owner.as_deref(), user_id) {
            (Some(owner), Some(user)) => owner == user,
            _ => false,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Result type for interaction handlers
pub type BotResult<T> = Result<T, BotError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Parameters missing or malformed; reported to the user as-is
    InvalidParams,
    /// A lookup or store operation failed
    OperationFailed,
    /// Outbound delivery failed
    DeliveryFailed,
    InternalError,
}

/// Error type for interaction handlers
#[derive(Debug, Clone)]
pub struct BotError {
    pub code: ErrorCode,
    pub message: String,
}

impl BotError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::OperationFailed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for BotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for BotError {}

impl From<anyhow::Error> for BotError {
    fn from(err: anyhow::Error) -> Self {
        Self::operation_failed(err.to_string())
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_params(err.to_string())
    }
}

impl From<crate::server::platform::PlatformError> for BotError {
    fn from(err: crate::server::platform::PlatformError) -> Self {
        Self::new(ErrorCode::DeliveryFailed, err.to_string())
    }
}

impl From<tokio::task::JoinError> for BotError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(format!("background task failed: {}", err))
    }
}

// =============================================================================
// Handler Trait
// =============================================================================

/// Whether a handler answers a slash command or a message component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Command,
    Component,
}

/// What a handler wants delivered once its work is done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Replace the original response of the interaction that issued `token`
    EditOriginal { token: String, message: Message },
    /// Post an additional message through `token`
    Followup { token: String, message: Message },
    /// Nothing to deliver
    Nothing,
}

/// Trait for interaction handlers
///
/// Parameters are parsed and validated synchronously, before the interaction
/// is acknowledged, so a rejection can be answered immediately. `handle` runs
/// afterwards in a background task.
#[async_trait]
pub trait InteractionMethod: Send + Sync + 'static {
    /// Command name or component custom id
    const NAME: &'static str;

    const KIND: HandlerKind;

    type Params: DeserializeOwned + Send + 'static;

    fn validate(_params: &Self::Params) -> BotResult<()> {
        Ok(())
    }

    async fn handle(
        ctx: Arc<BotContext>,
        interaction: Interaction,
        params: Self::Params,
    ) -> BotResult<Reply>;
}

// =============================================================================
// Handler Registration
// =============================================================================

/// Deferred handler body, run after the acknowledgement is sent
pub type HandlerFuture = futures::future::BoxFuture<'static, BotResult<Reply>>;

/// Type-erased handler function
///
/// The outer result carries parse and validation failures.
pub type DynHandler =
    Box<dyn Fn(Arc<BotContext>, Interaction) -> BotResult<HandlerFuture> + Send + Sync>;

/// Create a type-erased handler from an InteractionMethod implementation
pub fn make_handler<M: InteractionMethod>() -> DynHandler {
    Box::new(
        move |ctx: Arc<BotContext>, interaction: Interaction| -> BotResult<HandlerFuture> {
            // Parse parameters
            let params: M::Params = serde_json::from_value(interaction.params())?;

            // Validate parameters
            M::validate(&params)?;

            let future: HandlerFuture =
                Box::pin(async move { M::handle(ctx, interaction, params).await });
            Ok(future)
        },
    )
}

// =============================================================================
// Tests
// =============================================================================
