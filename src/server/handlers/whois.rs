//! The `/whois` command
//!
//! Looks the query up over RDAP and renders the first view of the report. When
//! RDAP fails the raw query is sent to a WHOIS server and the answer attached
//! as a text file.

use super::{fetch_blocking, report_message, store_session, GOT_RESPONSE};
use crate::database::Session;
use crate::lens::rdap::{normalize_query, render, RdapView};
use crate::lens::whois::WHOIS_FILE_NAME;
use crate::message::{FileAttachment, Message};
use crate::server::handler::{
    BotContext, BotError, BotResult, HandlerKind, InteractionMethod, Reply,
};
use crate::server::protocol::Interaction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

pub const NOTHING_FOUND: &str = "Could not find any information for the given query.";

/// Parameters for `/whois`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WhoisParams {
    /// Domain name or IP address
    #[serde(default)]
    pub domain: Option<String>,
}

pub struct WhoisCommand;

#[async_trait]
impl InteractionMethod for WhoisCommand {
    const NAME: &'static str = "whois";
    const KIND: HandlerKind = HandlerKind::Command;

    type Params = WhoisParams;

    fn validate(params: &Self::Params) -> BotResult<()> {
        match params.domain.as_deref() {
            Some(domain) if !domain.trim().is_empty() => Ok(()),
            _ => Err(BotError::invalid_params("No input given")),
        }
    }

    async fn handle(
        ctx: Arc<BotContext>,
        interaction: Interaction,
        params: Self::Params,
    ) -> BotResult<Reply> {
        let input = params.domain.unwrap_or_default();
        let result = fetch_blocking(&ctx, &input).await?;

        if let Some(record) = result.record() {
            let session = Session {
                token: interaction.token.clone(),
                query: normalize_query(&input),
            };
            store_session(&ctx, &interaction.id, session).await;

            let footer = format!(
                "Data fetched from {}",
                result.source.as_deref().unwrap_or("unknown")
            );
            let outcome = render(&result, RdapView::initial_for(record), 1, &footer);
            return Ok(Reply::EditOriginal {
                token: interaction.token,
                message: report_message(Some(GOT_RESPONSE.to_string()), outcome),
            });
        }

        let rdap_error = result.error().unwrap_or_default().to_string();
        info!("rdap lookup for {} failed ({}), trying whois", input, rdap_error);

        let whois = Arc::clone(&ctx.whois);
        let raw_input = input.clone();
        let answer = tokio::task::spawn_blocking(move || whois.query(&raw_input)).await?;

        let message = match answer {
            Ok(Some(text)) => Message::text(format!(
                "{}\n(Defaulted to WHOIS due to an error. `{}`)",
                GOT_RESPONSE, rdap_error
            ))
            .with_file(FileAttachment::text(WHOIS_FILE_NAME, text)),
            Ok(None) => Message::text(NOTHING_FOUND),
            Err(e) => {
                warn!("whois lookup for {} failed: {}", input, e);
                Message::text(NOTHING_FOUND)
            }
        };

        Ok(Reply::EditOriginal {
            token: interaction.token,
            message,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lens::rdap::tests::example_transport;
    use crate::lens::rdap::{NO_RESPONSE, PAGE_FIELD_NAME, SELECT_MENU_ID};
    use crate::server::testing::{command, harness, test_context, FakeWhois};
    use serde_json::json;

    fn params(domain: &str) -> WhoisParams {
        WhoisParams {
            domain: Some(domain.to_string()),
        }
    }

    async fn run(ctx: &BotContext, domain: &str) -> Message {
        let interaction = command("whois", json!({ "domain": domain }));
        let reply = WhoisCommand::handle(Arc::new(ctx.clone()), interaction, params(domain))
            .await
            .unwrap();
        match reply {
            Reply::EditOriginal { token, message } => {
                assert_eq!(token, "command-token");
                message
            }
            other => panic!("unexpected reply {:?}", other),
        }
    }

    #[test]
    fn test_validate() {
        assert!(WhoisCommand::validate(&params("example.com")).is_ok());
        assert!(WhoisCommand::validate(&params("  ")).is_err());
        let err = WhoisCommand::validate(&WhoisParams::default()).unwrap_err();
        assert_eq!(err.message, "No input given");
    }

    #[tokio::test]
    async fn test_domain_report() {
        let harness = test_context();
        let message = run(&harness.ctx, " Example.COM ").await;

        assert_eq!(message.content.as_deref(), Some(GOT_RESPONSE));
        let embed = &message.embeds[0];
        assert_eq!(embed.footer_text(), "Data fetched from rdap.example.net");
        assert_eq!(embed.fields[0].name, "Name Servers");
        assert!(message.components[0].find(SELECT_MENU_ID).is_some());

        let session = harness
            .ctx
            .sessions
            .get("1180000000000000001")
            .unwrap()
            .unwrap();
        assert_eq!(session.token, "command-token");
        assert_eq!(session.query, "example.com");
    }

    /// Store that rejects every write
    struct ReadOnlyStore;

    impl crate::database::KvStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn put(&self, _key: &str, _value: &str, _ttl: std::time::Duration) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("attempt to write a readonly database"))
        }
    }

    #[tokio::test]
    async fn test_report_delivered_when_session_write_fails() {
        let mut harness = test_context();
        harness.ctx.sessions = crate::database::SessionStore::new(Arc::new(ReadOnlyStore));

        let message = run(&harness.ctx, "example.com").await;
        assert_eq!(message.content.as_deref(), Some(GOT_RESPONSE));
        assert_eq!(message.embeds[0].fields[0].name, "Name Servers");
        assert!(harness
            .ctx
            .sessions
            .get("1180000000000000001")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_ip_report_starts_on_ip_info() {
        let harness = test_context();
        let message = run(&harness.ctx, "8.8.8.8").await;
        let names: Vec<_> = message.embeds[0]
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["IP CIDR(s)", "Block Name", "Ip Version", "Ip Country"]);
        assert_ne!(names[0], PAGE_FIELD_NAME);
    }

    #[tokio::test]
    async fn test_whois_fallback() {
        let whois = FakeWhois {
            answer: Some("domain: UNKNOWN.TEST\n".to_string()),
            ..Default::default()
        };
        let harness = harness(example_transport(), whois);
        let message = run(&harness.ctx, "Unknown.Test").await;

        assert_eq!(
            message.content.as_deref(),
            Some(
                "Got a response:tm:!\n(Defaulted to WHOIS due to an error. `RDAP server did not respond.`)"
            )
        );
        assert!(message.content.unwrap().contains(NO_RESPONSE));
        assert_eq!(message.files[0].file_name, WHOIS_FILE_NAME);
        assert!(message.embeds.is_empty());

        // whois gets the input as typed
        assert_eq!(*harness.whois.queries.lock().unwrap(), vec!["Unknown.Test"]);
        assert!(harness
            .ctx
            .sessions
            .get("1180000000000000001")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let harness = test_context();
        let message = run(&harness.ctx, "unknown.test").await;
        assert_eq!(message.content.as_deref(), Some(NOTHING_FOUND));
        assert!(message.files.is_empty());
    }
}
