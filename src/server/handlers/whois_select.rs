//! The view select menu on a report

use super::{carried_over, expired, fetch_blocking, origin_session, report_message};
use crate::lens::rdap::{render, RdapView, RenderOutcome, SELECT_MENU_ID};
use crate::message::Message;
use crate::server::handler::{BotContext, BotResult, HandlerKind, InteractionMethod, Reply};
use crate::server::protocol::Interaction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SelectParams {
    /// Selected menu values; only the first is used
    #[serde(default)]
    pub values: Vec<String>,
}

pub struct WhoisSelectHandler;

#[async_trait]
impl InteractionMethod for WhoisSelectHandler {
    const NAME: &'static str = SELECT_MENU_ID;
    const KIND: HandlerKind = HandlerKind::Component;

    type Params = SelectParams;

    async fn handle(
        ctx: Arc<BotContext>,
        interaction: Interaction,
        params: Self::Params,
    ) -> BotResult<Reply> {
        let Some(session) = origin_session(&ctx, &interaction).await? else {
            return Ok(expired(&interaction));
        };

        let selected = params.values.first().map(String::as_str).unwrap_or_default();
        let view = match selected.parse::<RdapView>() {
            Ok(view) => view,
            Err(e) => {
                debug!("ignoring selection: {}", e);
                return Ok(Reply::Nothing);
            }
        };

        let result = fetch_blocking(&ctx, &session.query).await?;
        if !result.is_success() {
            return Ok(expired(&interaction));
        }

        let (content, footer) = carried_over(&interaction);
        match render(&result, view, 1, &footer) {
            RenderOutcome::Raw(file) => Ok(Reply::Followup {
                token: session.token,
                message: Message::default().with_file(file),
            }),
            outcome => Ok(Reply::EditOriginal {
                token: session.token,
                message: report_message(content, outcome),
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
