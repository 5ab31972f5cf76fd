//! Router module for registry-based interaction dispatch
//!
//! This module provides the `Router`, a registry of command and component
//! handlers, and the `Dispatcher`, which answers each interaction immediately
//! and runs the matching handler in the background.
//!
//! Dispatch rules:
//! - PING is answered with PONG and nothing else happens.
//! - Unknown names and invalid parameters are answered right away with an
//!   ephemeral message.
//! - Otherwise the interaction is deferred and the handler's reply is
//!   delivered through the platform client once it completes.

use crate::message::{FileAttachment, Message};
use crate::server::handler::{
    make_handler, BotContext, BotError, BotResult, DynHandler, HandlerKind, InteractionMethod,
    Reply,
};
use crate::server::protocol::{Interaction, InteractionResponse, InteractionType};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub const COMMAND_ERRORED: &str = "Command errored!";
pub const ERROR_FILE_NAME: &str = "error.txt";

// =============================================================================
// Router
// =============================================================================

/// Registry of handlers, keyed separately for commands and components
pub struct Router {
    commands: HashMap<&'static str, DynHandler>,
    components: HashMap<&'static str, DynHandler>,
}

impl Router {
    /// Create a new empty router
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            components: HashMap::new(),
        }
    }

    /// Register a handler
    pub fn register<M: InteractionMethod>(&mut self) -> &mut Self {
        let handler = make_handler::<M>();
        match M::KIND {
            HandlerKind::Command => self.commands.insert(M::NAME, handler),
            HandlerKind::Component => self.components.insert(M::NAME, handler),
        };
        self
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn has_component(&self, custom_id: &str) -> bool {
        self.components.contains_key(custom_id)
    }

    /// Get the handler for a name of the given kind
    pub fn get_handler(&self, kind: HandlerKind, name: &str) -> Option<&DynHandler> {
        match kind {
            HandlerKind::Command => self.commands.get(name),
            HandlerKind::Component => self.components.get(name),
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Immediate response plus the background task delivering the real reply
pub struct Dispatched {
    pub response: InteractionResponse,
    pub task: Option<JoinHandle<()>>,
}

impl Dispatched {
    fn immediate(response: InteractionResponse) -> Self {
        Self {
            response,
            task: None,
        }
    }
}

/// Dispatcher for routing and executing interactions
pub struct Dispatcher {
    router: Arc<Router>,
    context: Arc<BotContext>,
}

impl Dispatcher {
    pub fn new(router: Router, context: BotContext) -> Self {
        Self {
            router: Arc::new(router),
            context: Arc::new(context),
        }
    }

    pub fn context(&self) -> &Arc<BotContext> {
        &self.context
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Dispatch an interaction
    ///
    /// Must be called from within a tokio runtime; the handler body is spawned.
    pub fn dispatch(&self, interaction: Interaction) -> Dispatched {
        let kind = match interaction.kind {
            InteractionType::Ping => return Dispatched::immediate(InteractionResponse::pong()),
            InteractionType::ApplicationCommand => HandlerKind::Command,
            InteractionType::MessageComponent => HandlerKind::Component,
            other => {
                debug!("ignoring unsupported interaction type {:?}", other);
                return Dispatched::immediate(InteractionResponse::message(Message::ephemeral(
                    "Unsupported interaction.",
                )));
            }
        };

        let name = interaction.handler_name().unwrap_or_default().to_string();
        if self.context.config.interaction_debug {
            info!(
                user = interaction.user_id().unwrap_or("unknown"),
                kind = ?kind,
                name = %name,
                channel = interaction.channel_id.as_deref().unwrap_or("none"),
                id = %interaction.id,
                params = %interaction.params(),
                "interaction received"
            );
        }

        let Some(handler) = self.router.get_handler(kind, &name) else {
            let text = match kind {
                HandlerKind::Command => format!("No command found for `{}`", name),
                HandlerKind::Component => format!("No component code found for `{}`", name),
            };
            return Dispatched::immediate(InteractionResponse::message(Message::ephemeral(text)));
        };

        let future = match handler(Arc::clone(&self.context), interaction.clone()) {
            Ok(future) => future,
            Err(e) => {
                debug!("rejected {}: {}", name, e);
                return Dispatched::immediate(InteractionResponse::message(Message::ephemeral(
                    e.message,
                )));
            }
        };

        let ctx = Arc::clone(&self.context);
        let task = tokio::spawn(async move {
            // the inner spawn isolates handler panics
            let outcome = match tokio::spawn(future).await {
                Ok(outcome) => outcome,
                Err(e) => Err(BotError::from(e)),
            };
            finish(ctx, interaction, outcome).await;
        });

        let response = match kind {
            HandlerKind::Command => InteractionResponse::deferred_message(),
            HandlerKind::Component => InteractionResponse::deferred_update(),
        };

        Dispatched {
            response,
            task: Some(task),
        }
    }
}

/// Deliver a handler outcome, reporting failures to the invoking user
async fn finish(ctx: Arc<BotContext>, interaction: Interaction, outcome: BotResult<Reply>) {
    let reply = match outcome {
        Ok(reply) => reply,
        Err(e) => {
            error!(
                "handler {} failed for interaction {}: {}",
                interaction.handler_name().unwrap_or_default(),
                interaction.id,
                e
            );
            error_reply(&ctx, &interaction, &e)
        }
    };

    if let Err(e) = deliver(&ctx, reply).await {
        error!("failed to deliver reply for interaction {}: {}", interaction.id, e);
    }
}

/// "Command errored!" for everyone; the bot owner also gets the error text
fn error_reply(ctx: &BotContext, interaction: &Interaction, err: &BotError) -> Reply {
    let mut message = Message::ephemeral(COMMAND_ERRORED);
    if ctx.is_owner(interaction.user_id()) {
        message = message.with_file(FileAttachment::text(ERROR_FILE_NAME, err.to_string()));
    }
    Reply::Followup {
        token: interaction.token.clone(),
        message,
    }
}

async fn deliver(ctx: &BotContext, reply: Reply) -> BotResult<()> {
    match reply {
        Reply::EditOriginal { token, message } => {
            ctx.platform.edit_original(&token, &message).await?
        }
        Reply::Followup { token, message } => {
            ctx.platform.create_followup(&token, &message).await?
        }
        Reply::Nothing => {}
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
