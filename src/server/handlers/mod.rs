//! Interaction handlers
//!
//! Each handler implements the `InteractionMethod` trait for one slash command
//! or one message component.
//!
//! - `whois` - the `/whois` command (RDAP lookup with WHOIS fallback)
//! - `whois_select` - the view select menu on a report
//! - `whois_page` - previous/next buttons on the entities view

pub mod whois;
pub mod whois_page;
pub mod whois_select;

pub use whois::{WhoisCommand, WhoisParams};
pub use whois_page::{PageParams, WhoisNextHandler, WhoisPreviousHandler};
pub use whois_select::{SelectParams, WhoisSelectHandler};

use crate::database::Session;
use crate::lens::rdap::{RdapFetchResult, RenderOutcome};
use crate::message::Message;
use crate::server::handler::{BotContext, BotResult, Reply};
use crate::server::protocol::Interaction;
use std::sync::Arc;
use tracing::{debug, warn};

pub const GOT_RESPONSE: &str = "Got a response:tm:!";
pub const QUERY_EXPIRED: &str = "This query has expired.";

/// Run a lookup on the blocking pool
pub(crate) async fn fetch_blocking(ctx: &BotContext, query: &str) -> BotResult<RdapFetchResult> {
    let lens = Arc::clone(&ctx.lens);
    let query = query.to_string();
    Ok(tokio::task::spawn_blocking(move || lens.fetch(&query)).await?)
}

/// Session of the command that created the component's message
pub(crate) async fn origin_session(
    ctx: &BotContext,
    interaction: &Interaction,
) -> BotResult<Option<Session>> {
    let Some(origin) = interaction.origin_interaction_id() else {
        debug!("component interaction {} has no origin", interaction.id);
        return Ok(None);
    };
    let sessions = ctx.sessions.clone();
    let origin = origin.to_string();
    Ok(tokio::task::spawn_blocking(move || sessions.get(&origin)).await??)
}

/// Remember a command's query so its report can be updated later
///
/// A report is still delivered when this fails; only its controls stop working.
pub(crate) async fn store_session(ctx: &BotContext, interaction_id: &str, session: Session) {
    let sessions = ctx.sessions.clone();
    let key = interaction_id.to_string();
    match tokio::task::spawn_blocking(move || sessions.put(&key, &session)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("failed to store session {}: {}", interaction_id, e),
        Err(e) => warn!("session write for {} did not complete: {}", interaction_id, e),
    }
}

/// Tell the clicking user the report can no longer be updated
pub(crate) fn expired(interaction: &Interaction) -> Reply {
    Reply::Followup {
        token: interaction.token.clone(),
        message: Message::ephemeral(QUERY_EXPIRED),
    }
}

/// Content and footer of the message a component sits on
pub(crate) fn carried_over(interaction: &Interaction) -> (Option<String>, String) {
    let Some(message) = interaction.message.as_ref() else {
        return (None, String::new());
    };
    let footer = message
        .embeds
        .first()
        .map(|e| e.footer_text().to_string())
        .unwrap_or_default();
    (message.content.clone(), footer)
}

/// Message for a rendered report; raw output travels as a file
pub(crate) fn report_message(content: Option<String>, outcome: RenderOutcome) -> Message {
    let mut message = Message {
        content,
        ..Default::default()
    };
    match outcome {
        RenderOutcome::Report(report) => {
            message.embeds = report.embeds;
            message.components = report.components;
        }
        RenderOutcome::Raw(file) => message.files.push(file),
    }
    message
}
