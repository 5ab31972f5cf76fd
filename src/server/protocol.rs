//! Protocol types for the interaction endpoint
//!
//! Inbound interactions and the immediate callback the endpoint answers with.
//! Enum codes are serialized as the platform's integers.

use crate::message::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    MessageComponent,
    Autocomplete,
    ModalSubmit,
}

impl From<InteractionType> for u8 {
    fn from(kind: InteractionType) -> u8 {
        match kind {
            InteractionType::Ping => 1,
            InteractionType::ApplicationCommand => 2,
            InteractionType::MessageComponent => 3,
            InteractionType::Autocomplete => 4,
            InteractionType::ModalSubmit => 5,
        }
    }
}

impl TryFrom<u8> for InteractionType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(InteractionType::Ping),
            2 => Ok(InteractionType::ApplicationCommand),
            3 => Ok(InteractionType::MessageComponent),
            4 => Ok(InteractionType::Autocomplete),
            5 => Ok(InteractionType::ModalSubmit),
            other => Err(format!("unknown interaction type {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Guild member wrapper; the user is nested inside
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
}

/// One slash-command option as sent by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionData {
    /// Command name (application commands)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Component id (message components)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
    /// Selected select-menu values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    #[serde(default)]
    pub data: Option<InteractionData>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub member: Option<Member>,
    /// Present instead of `member` outside guilds
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: String,
    /// Message a component was attached to
    #[serde(default)]
    pub message: Option<Message>,
}

impl Interaction {
    /// Id of the invoking user, in a guild or not
    pub fn user_id(&self) -> Option<&str> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
            .map(|u| u.id.as_str())
    }

    /// Command name or component custom id, depending on the interaction type
    pub fn handler_name(&self) -> Option<&str> {
        let data = self.data.as_ref()?;
        match self.kind {
            InteractionType::MessageComponent => data.custom_id.as_deref(),
            _ => data.name.as_deref(),
        }
    }

    /// Handler parameters as a JSON object
    ///
    /// Commands map option names to values; components expose `custom_id`
    /// and `values`.
    pub fn params(&self) -> Value {
        let mut params = Map::new();
        if let Some(data) = &self.data {
            for option in &data.options {
                params.insert(option.name.clone(), option.value.clone());
            }
            if let Some(custom_id) = &data.custom_id {
                params.insert("custom_id".to_string(), Value::String(custom_id.clone()));
            }
            if !data.values.is_empty() {
                params.insert("values".to_string(), Value::from(data.values.clone()));
            }
        }
        Value::Object(params)
    }

    /// Id of the command interaction that created the message this component sits on
    pub fn origin_interaction_id(&self) -> Option<&str> {
        self.message
            .as_ref()
            .and_then(|m| m.interaction_metadata.as_ref())
            .map(|meta| meta.id.as_str())
    }
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CallbackType {
    Pong,
    ChannelMessageWithSource,
    DeferredChannelMessageWithSource,
    DeferredUpdateMessage,
    UpdateMessage,
}

impl From<CallbackType> for u8 {
    fn from(kind: CallbackType) -> u8 {
        match kind {
            CallbackType::Pong => 1,
            CallbackType::ChannelMessageWithSource => 4,
            CallbackType::DeferredChannelMessageWithSource => 5,
            CallbackType::DeferredUpdateMessage => 6,
            CallbackType::UpdateMessage => 7,
        }
    }
}

impl TryFrom<u8> for CallbackType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CallbackType::Pong),
            4 => Ok(CallbackType::ChannelMessageWithSource),
            5 => Ok(CallbackType::DeferredChannelMessageWithSource),
            6 => Ok(CallbackType::DeferredUpdateMessage),
            7 => Ok(CallbackType::UpdateMessage),
            other => Err(format!("unknown callback type {}", other)),
        }
    }
}

/// Immediate answer to an interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: CallbackType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Message>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: CallbackType::Pong,
            data: None,
        }
    }

    /// "Thinking" placeholder for a command whose reply follows later
    pub fn deferred_message() -> Self {
        Self {
            kind: CallbackType::DeferredChannelMessageWithSource,
            data: None,
        }
    }

    /// Acknowledge a component without changing its message yet
    pub fn deferred_update() -> Self {
        Self {
            kind: CallbackType::DeferredUpdateMessage,
            data: None,
        }
    }

    pub fn message(message: Message) -> Self {
        Self {
            kind: CallbackType::ChannelMessageWithSource,
            data: Some(message),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_command_interaction() {
        let interaction: Interaction = serde_json::from_value(json!({
            "id": "1180000000000000001",
            "application_id": "42",
            "type": 2,
            "token": "tok",
            "channel_id": "7",
            "member": {"user": {"id": "99", "username": "alice"}},
            "data": {"name": "whois", "options": [{"name": "domain", "type": 3, "value": "example.com"}]}
        }))
        .unwrap();

        assert_eq!(interaction.kind, InteractionType::ApplicationCommand);
        assert_eq!(interaction.user_id(), Some("99"));
        assert_eq!(interaction.handler_name(), Some("whois"));
        assert_eq!(interaction.params(), json!({"domain": "example.com"}));
    }

    #[test]
    fn test_parse_component_interaction() {
        let interaction: Interaction = serde_json::from_value(json!({
            "id": "2",
            "type": 3,
            "token": "component-token",
            "user": {"id": "5"},
            "data": {"custom_id": "whois_select_menu", "component_type": 3, "values": ["events"]},
            "message": {
                "id": "m1",
                "content": "Got a response:tm:!",
                "embeds": [],
                "components": [],
                "interaction_metadata": {"id": "1", "type": 2}
            }
        }))
        .unwrap();

        assert_eq!(interaction.user_id(), Some("5"));
        assert_eq!(interaction.handler_name(), Some("whois_select_menu"));
        assert_eq!(interaction.origin_interaction_id(), Some("1"));
        assert_eq!(
            interaction.params(),
            json!({"custom_id": "whois_select_menu", "values": ["events"]})
        );
    }

    #[test]
    fn test_unknown_interaction_type_is_rejected() {
        let result = serde_json::from_value::<Interaction>(json!({"id": "1", "type": 9}));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_serialization() {
        assert_eq!(
            serde_json::to_value(InteractionResponse::pong()).unwrap(),
            json!({"type": 1})
        );
        assert_eq!(
            serde_json::to_value(InteractionResponse::deferred_message()).unwrap(),
            json!({"type": 5})
        );
        assert_eq!(
            serde_json::to_value(InteractionResponse::deferred_update()).unwrap(),
            json!({"type": 6})
        );

        let reply = InteractionResponse::message(Message::ephemeral("No input given"));
        let value = serde_json::to_value(reply).unwrap();
        assert_eq!(value["type"], 4);
        assert_eq!(value["data"]["flags"], 64);
        assert_eq!(value["data"]["content"], "No input given");
    }
}
