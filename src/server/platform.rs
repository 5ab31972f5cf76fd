//! Outbound calls to the chat platform
//!
//! Replies are delivered after the endpoint has already acknowledged the
//! interaction, by editing the original response or posting a follow-up
//! through the interaction's webhook token.

use crate::message::Message;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use std::time::Duration;
use tracing::debug;

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("bot token is malformed: {0}")]
    InvalidToken(String),

    #[error("platform request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("platform answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Webhook operations keyed by an interaction token
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Replace the original response of the interaction that issued `token`
    async fn edit_original(&self, token: &str, message: &Message) -> Result<(), PlatformError>;

    /// Fetch the original response of the interaction that issued `token`
    async fn get_original(&self, token: &str) -> Result<Message, PlatformError>;

    /// Post an additional message for the interaction that issued `token`
    async fn create_followup(&self, token: &str, message: &Message) -> Result<(), PlatformError>;
}

/// Application id encoded in the first segment of a bot token
pub fn application_id_from_token(bot_token: &str) -> Result<String, PlatformError> {
    let segment = bot_token
        .split('.')
        .next()
        .unwrap_or_default()
        .trim_end_matches('=');
    let decoded = STANDARD_NO_PAD
        .decode(segment)
        .map_err(|e| PlatformError::InvalidToken(e.to_string()))?;
    let id = String::from_utf8(decoded).map_err(|e| PlatformError::InvalidToken(e.to_string()))?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(PlatformError::InvalidToken(
            "first segment is not an application id".to_string(),
        ));
    }
    Ok(id)
}

/// Build the multipart body for a message carrying files
///
/// The JSON payload goes in `payload_json`; each file is part `files[i]` and is
/// referenced from the payload's `attachments` by index.
pub fn multipart_body(message: &Message) -> Result<Form, PlatformError> {
    let mut payload = serde_json::to_value(message)?;
    payload["attachments"] = serde_json::to_value(message.attachment_refs())?;

    let mut form = Form::new().text("payload_json", payload.to_string());
    for (i, file) in message.files.iter().enumerate() {
        let part = Part::bytes(file.content.clone())
            .file_name(file.file_name.clone())
            .mime_str("text/plain")?;
        form = form.part(format!("files[{}]", i), part);
    }
    Ok(form)
}

pub struct DiscordClient {
    http: Client,
    api_base: String,
    application_id: String,
}

impl DiscordClient {
    pub fn new(bot_token: &str, timeout: Duration) -> Result<Self, PlatformError> {
        let application_id = application_id_from_token(bot_token)?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bot {}", bot_token))
            .map_err(|e| PlatformError::InvalidToken(e.to_string()))?;
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("rdapbot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_base: DISCORD_API_BASE.to_string(),
            application_id,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    fn webhook_url(&self, token: &str, suffix: &str) -> String {
        format!(
            "{}/webhooks/{}/{}{}",
            self.api_base.trim_end_matches('/'),
            self.application_id,
            token,
            suffix
        )
    }

    fn with_message(
        &self,
        request: RequestBuilder,
        message: &Message,
    ) -> Result<RequestBuilder, PlatformError> {
        if message.files.is_empty() {
            Ok(request.json(message))
        } else {
            Ok(request.multipart(multipart_body(message)?))
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, PlatformError> {
        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(PlatformError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl PlatformClient for DiscordClient {
    async fn edit_original(&self, token: &str, message: &Message) -> Result<(), PlatformError> {
        let url = self.webhook_url(token, "/messages/@original");
        debug!("PATCH {}", self.webhook_url("<token>", "/messages/@original"));
        let request = self.with_message(self.http.request(Method::PATCH, url), message)?;
        self.send(request).await?;
        Ok(())
    }

    async fn get_original(&self, token: &str) -> Result<Message, PlatformError> {
        let url = self.webhook_url(token, "/messages/@original");
        let resp = self.send(self.http.get(url)).await?;
        Ok(resp.json::<Message>().await?)
    }

    async fn create_followup(&self, token: &str, message: &Message) -> Result<(), PlatformError> {
        let url = self.webhook_url(token, "");
        debug!("POST {}", self.webhook_url("<token>", ""));
        let request = self.with_message(self.http.post(url), message)?;
        self.send(request).await?;
        Ok(())
    }
}
