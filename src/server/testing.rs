//! In-process fakes for server tests

use crate::config::BotConfig;
use crate::database::{ManualClock, MemoryKvStore, RdapCache, SessionStore};
use crate::lens::rdap::tests::{example_transport, FakeTransport};
use crate::lens::rdap::{RdapEndpoints, RdapLens};
use crate::lens::whois::WhoisClient;
use crate::message::{InteractionMetadata, Message};
use crate::server::handler::BotContext;
use crate::server::platform::{PlatformClient, PlatformError};
use crate::server::protocol::{CommandOption, Interaction, InteractionData, InteractionType, User};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// One outbound platform call
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Delivered {
    Edit { token: String, message: Message },
    Followup { token: String, message: Message },
}

#[derive(Default)]
pub(crate) struct FakePlatform {
    delivered: Mutex<Vec<Delivered>>,
    original: Mutex<Option<Message>>,
}

impl FakePlatform {
    pub(crate) fn delivered(&self) -> Vec<Delivered> {
        self.delivered.lock().unwrap().clone()
    }

    /// Message returned by `get_original`
    pub(crate) fn set_original(&self, message: Message) {
        *self.original.lock().unwrap() = Some(message);
    }
}

#[async_trait]
impl PlatformClient for FakePlatform {
    async fn edit_original(&self, token: &str, message: &Message) -> Result<(), PlatformError> {
        self.delivered.lock().unwrap().push(Delivered::Edit {
            token: token.to_string(),
            message: message.clone(),
        });
        Ok(())
    }

    async fn get_original(&self, _token: &str) -> Result<Message, PlatformError> {
        self.original
            .lock()
            .unwrap()
            .clone()
            .ok_or(PlatformError::Status {
                status: 404,
                body: "Unknown Message".to_string(),
            })
    }

    async fn create_followup(&self, token: &str, message: &Message) -> Result<(), PlatformError> {
        self.delivered.lock().unwrap().push(Delivered::Followup {
            token: token.to_string(),
            message: message.clone(),
        });
        Ok(())
    }
}

/// WHOIS client answering every query with the same text
#[derive(Default)]
pub(crate) struct FakeWhois {
    pub answer: Option<String>,
    pub queries: Mutex<Vec<String>>,
}

impl WhoisClient for FakeWhois {
    fn query(&self, query: &str) -> anyhow::Result<Option<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.answer.clone())
    }
}

pub(crate) struct TestHarness {
    pub ctx: BotContext,
    pub platform: Arc<FakePlatform>,
    pub transport: Arc<FakeTransport>,
    pub whois: Arc<FakeWhois>,
    pub clock: Arc<ManualClock>,
}

/// Context with the example RDAP records, no WHOIS data and a manual clock
pub(crate) fn test_context() -> TestHarness {
    harness(example_transport(), FakeWhois::default())
}

pub(crate) fn harness(transport: FakeTransport, whois: FakeWhois) -> TestHarness {
    let clock = Arc::new(ManualClock::default());
    let store = Arc::new(MemoryKvStore::with_clock(clock.clone()));
    let transport = Arc::new(transport);
    let whois = Arc::new(whois);
    let platform = Arc::new(FakePlatform::default());

    let ctx = BotContext {
        config: BotConfig::default(),
        lens: Arc::new(RdapLens::new(
            transport.clone(),
            RdapCache::new(store.clone()),
            RdapEndpoints::default(),
        )),
        sessions: SessionStore::new(store),
        whois: whois.clone(),
        platform: platform.clone(),
    };

    TestHarness {
        ctx,
        platform,
        transport,
        whois,
        clock,
    }
}

/// Slash-command interaction with the given options object
pub(crate) fn command(name: &str, options: serde_json::Value) -> Interaction {
    let options = options
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(name, value)| CommandOption {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    Interaction {
        id: "1180000000000000001".to_string(),
        application_id: Some("42".to_string()),
        kind: InteractionType::ApplicationCommand,
        data: Some(InteractionData {
            name: Some(name.to_string()),
            options,
            ..Default::default()
        }),
        channel_id: Some("7".to_string()),
        member: None,
        user: Some(User {
            id: "99".to_string(),
            username: None,
        }),
        token: "command-token".to_string(),
        message: None,
    }
}

/// Component interaction on `message`, which was created by interaction `origin_id`
pub(crate) fn component(
    custom_id: &str,
    values: &[&str],
    message: &Message,
    origin_id: &str,
) -> Interaction {
    let mut message = message.clone();
    message.interaction_metadata = Some(InteractionMetadata {
        id: origin_id.to_string(),
    });

    Interaction {
        id: "1180000000000000002".to_string(),
        application_id: Some("42".to_string()),
        kind: InteractionType::MessageComponent,
        data: Some(InteractionData {
            custom_id: Some(custom_id.to_string()),
            values: values.iter().map(|v| v.to_string()).collect(),
            ..Default::default()
        }),
        channel_id: Some("7".to_string()),
        member: None,
        user: Some(User {
            id: "99".to_string(),
            username: None,
        }),
        token: "component-token".to_string(),
        message: Some(message),
    }
}
