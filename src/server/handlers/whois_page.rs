//! Previous/next buttons on the entities view
//!
//! The current page is read back from the report itself: the first embed field
//! of an entities page holds its number.

use super::{carried_over, expired, fetch_blocking, origin_session, report_message};
use crate::lens::rdap::{parse_page_field, render, RdapView, NEXT_BUTTON_ID, PREVIOUS_BUTTON_ID};
use crate::server::handler::{BotContext, BotResult, HandlerKind, InteractionMethod, Reply};
use crate::server::protocol::Interaction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PageParams {
    #[serde(default)]
    pub custom_id: Option<String>,
}

pub struct WhoisNextHandler;

#[async_trait]
impl InteractionMethod for WhoisNextHandler {
    const NAME: &'static str = NEXT_BUTTON_ID;
    const KIND: HandlerKind = HandlerKind::Component;

    type Params = PageParams;

    async fn handle(
        ctx: Arc<BotContext>,
        interaction: Interaction,
        _params: Self::Params,
    ) -> BotResult<Reply> {
        turn_page(ctx, interaction, 1).await
    }
}

pub struct WhoisPreviousHandler;

#[async_trait]
impl InteractionMethod for WhoisPreviousHandler {
    const NAME: &'static str = PREVIOUS_BUTTON_ID;
    const KIND: HandlerKind = HandlerKind::Component;

    type Params = PageParams;

    async fn handle(
        ctx: Arc<BotContext>,
        interaction: Interaction,
        _params: Self::Params,
    ) -> BotResult<Reply> {
        turn_page(ctx, interaction, -1).await
    }
}

async fn turn_page(ctx: Arc<BotContext>, interaction: Interaction, step: i64) -> BotResult<Reply> {
    let Some(session) = origin_session(&ctx, &interaction).await? else {
        return Ok(expired(&interaction));
    };

    let result = fetch_blocking(&ctx, &session.query).await?;
    if !result.is_success() {
        return Ok(expired(&interaction));
    }

    let current = match interaction
        .message
        .as_ref()
        .and_then(|m| parse_page_field(&m.embeds))
    {
        Some(page) => page,
        None => match ctx.platform.get_original(&session.token).await {
            Ok(original) => parse_page_field(&original.embeds).unwrap_or(1),
            Err(e) => {
                warn!("could not read back report page: {}", e);
                1
            }
        },
    };

    let (content, footer) = carried_over(&interaction);
    let outcome = render(
        &result,
        RdapView::Entities,
        current.saturating_add(step),
        &footer,
    );

    Ok(Reply::EditOriginal {
        token: session.token,
        message: report_message(content, outcome),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Session;
    use crate::lens::rdap::{render, RenderOutcome, PAGE_FIELD_NAME};
    use crate::message::{Embed, EmbedField, Message};
    use crate::server::handlers::{GOT_RESPONSE, QUERY_EXPIRED};
    use crate::server::testing::{component, test_context, TestHarness};

    const ORIGIN: &str = "1180000000000000001";

    fn start_session(harness: &TestHarness) {
        harness
            .ctx
            .sessions
            .put(
                ORIGIN,
                &Session {
                    token: "command-token".to_string(),
                    query: "example.com".to_string(),
                },
            )
            .unwrap();
    }

    /// Entities report for example.com at `page`
    fn entities_page(harness: &TestHarness, page: i64) -> Message {
        let result = harness.ctx.lens.fetch("example.com");
        let RenderOutcome::Report(report) =
            render(&result, RdapView::Entities, page, "Data fetched from RDAP Cache")
        else {
            panic!("expected a report");
        };
        Message {
            content: Some(GOT_RESPONSE.to_string()),
            embeds: report.embeds,
            components: report.components,
            ..Default::default()
        }
    }

    async fn press<M: InteractionMethod<Params = PageParams>>(
        harness: &TestHarness,
        on: &Message,
    ) -> Reply {
        let interaction = component(M::NAME, &[], on, ORIGIN);
        M::handle(Arc::new(harness.ctx.clone()), interaction, PageParams::default())
            .await
            .unwrap()
    }

    fn page_of(reply: &Reply) -> &str {
        let Reply::EditOriginal { message, .. } = reply else {
            panic!("expected an edit, got {:?}", reply);
        };
        let field = &message.embeds[0].fields[0];
        assert_eq!(field.name, PAGE_FIELD_NAME);
        &field.value
    }

    #[tokio::test]
    async fn test_next_and_previous() {
        let harness = test_context();
        start_session(&harness);

        let first = entities_page(&harness, 1);
        let reply = press::<WhoisNextHandler>(&harness, &first).await;
        assert_eq!(page_of(&reply), "2");

        let Reply::EditOriginal { token, message } = &reply else {
            unreachable!();
        };
        assert_eq!(token, "command-token");
        assert_eq!(message.content.as_deref(), Some(GOT_RESPONSE));
        assert_eq!(
            message.embeds[0].footer_text(),
            "Data fetched from RDAP Cache"
        );

        let back = press::<WhoisPreviousHandler>(&harness, message).await;
        assert_eq!(page_of(&back), "1");
    }

    #[tokio::test]
    async fn test_page_is_clamped() {
        let harness = test_context();
        start_session(&harness);

        let last = entities_page(&harness, 2);
        assert_eq!(page_of(&press::<WhoisNextHandler>(&harness, &last).await), "2");

        let first = entities_page(&harness, 1);
        assert_eq!(
            page_of(&press::<WhoisPreviousHandler>(&harness, &first).await),
            "1"
        );
    }

    #[tokio::test]
    async fn test_page_read_back_from_original() {
        let harness = test_context();
        start_session(&harness);
        harness.platform.set_original(entities_page(&harness, 2));

        let stripped = Message {
            embeds: vec![Embed {
                fields: vec![EmbedField::new("Name Servers", "ns")],
                ..Default::default()
            }],
            ..Default::default()
        };
        let reply = press::<WhoisPreviousHandler>(&harness, &stripped).await;
        assert_eq!(page_of(&reply), "1");
    }

    #[tokio::test]
    async fn test_expired_session_skips_lookup() {
        let harness = test_context();
        let first = Message::text(GOT_RESPONSE);

        let reply = press::<WhoisNextHandler>(&harness, &first).await;
        let Reply::Followup { token, message } = reply else {
            panic!("expected a followup");
        };
        assert_eq!(token, "component-token");
        assert_eq!(message.content.as_deref(), Some(QUERY_EXPIRED));
        assert_eq!(harness.transport.calls(), 0);
    }
}
