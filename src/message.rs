//! Chat message model
//!
//! Embeds, embed fields and interactive components as the interaction platform
//! expects them on the wire. The renderer produces these types and the server
//! sends them back unchanged, so they live outside the `server` feature.

use serde::{Deserialize, Serialize};

/// Message flag marking a reply as visible only to the invoking user
pub const EPHEMERAL_FLAG: u32 = 1 << 6;

// =============================================================================
// Embeds
// =============================================================================

/// A single name/value row inside an embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inline: bool,
}

impl EmbedField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: false,
        }
    }

    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            inline: true,
            ..Self::new(name, value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
}

impl Embed {
    /// Footer text, or an empty string if the embed has no footer
    pub fn footer_text(&self) -> &str {
        self.footer.as_ref().map(|f| f.text.as_str()).unwrap_or("")
    }
}

// =============================================================================
// Components
// =============================================================================

/// Component kind, serialized as the platform's integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ComponentType {
    ActionRow,
    Button,
    StringSelect,
    TextInput,
    UserSelect,
    RoleSelect,
    MentionableSelect,
    ChannelSelect,
}

impl From<ComponentType> for u8 {
    fn from(kind: ComponentType) -> u8 {
        match kind {
            ComponentType::ActionRow => 1,
            ComponentType::Button => 2,
            ComponentType::StringSelect => 3,
            ComponentType::TextInput => 4,
            ComponentType::UserSelect => 5,
            ComponentType::RoleSelect => 6,
            ComponentType::MentionableSelect => 7,
            ComponentType::ChannelSelect => 8,
        }
    }
}

impl TryFrom<u8> for ComponentType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ComponentType::ActionRow),
            2 => Ok(ComponentType::Button),
            3 => Ok(ComponentType::StringSelect),
            4 => Ok(ComponentType::TextInput),
            5 => Ok(ComponentType::UserSelect),
            6 => Ok(ComponentType::RoleSelect),
            7 => Ok(ComponentType::MentionableSelect),
            8 => Ok(ComponentType::ChannelSelect),
            other => Err(format!("unknown component type {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
    Link,
    Premium,
}

impl From<ButtonStyle> for u8 {
    fn from(style: ButtonStyle) -> u8 {
        match style {
            ButtonStyle::Primary => 1,
            ButtonStyle::Secondary => 2,
            ButtonStyle::Success => 3,
            ButtonStyle::Danger => 4,
            ButtonStyle::Link => 5,
            ButtonStyle::Premium => 6,
        }
    }
}

impl TryFrom<u8> for ButtonStyle {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ButtonStyle::Primary),
            2 => Ok(ButtonStyle::Secondary),
            3 => Ok(ButtonStyle::Success),
            4 => Ok(ButtonStyle::Danger),
            5 => Ok(ButtonStyle::Link),
            6 => Ok(ButtonStyle::Premium),
            other => Err(format!("unknown button style {}", other)),
        }
    }
}

/// One entry of a string select menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SelectOption {
    pub fn new(label: &str, value: &str, description: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            description: Some(description.to_string()),
        }
    }
}

/// A message component.
///
/// Action rows, buttons and select menus share one shape on the wire; which
/// optional fields are populated depends on `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "type")]
    pub kind: ComponentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
}

impl Component {
    fn empty(kind: ComponentType) -> Self {
        Self {
            kind,
            style: None,
            label: None,
            custom_id: None,
            disabled: false,
            options: Vec::new(),
            components: Vec::new(),
        }
    }

    pub fn action_row(components: Vec<Component>) -> Self {
        Self {
            components,
            ..Self::empty(ComponentType::ActionRow)
        }
    }

    pub fn button(style: ButtonStyle, label: &str, custom_id: &str, disabled: bool) -> Self {
        Self {
            style: Some(style),
            label: Some(label.to_string()),
            custom_id: Some(custom_id.to_string()),
            disabled,
            ..Self::empty(ComponentType::Button)
        }
    }

    pub fn string_select(custom_id: &str, options: Vec<SelectOption>) -> Self {
        Self {
            custom_id: Some(custom_id.to_string()),
            options,
            ..Self::empty(ComponentType::StringSelect)
        }
    }

    /// Find a component by custom id in this component or its children
    pub fn find(&self, custom_id: &str) -> Option<&Component> {
        if self.custom_id.as_deref() == Some(custom_id) {
            return Some(self);
        }
        self.components.iter().find_map(|c| c.find(custom_id))
    }
}

// =============================================================================
// Messages
// =============================================================================

/// A file delivered alongside a message as a multipart part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl FileAttachment {
    pub fn text(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into().into_bytes(),
        }
    }
}

/// Attachment descriptor referencing a multipart file part by index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: u64,
    pub filename: String,
}

/// Back-reference from a component message to the interaction that created it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionMetadata {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_metadata: Option<InteractionMetadata>,
    /// Files sent as multipart parts; never part of the JSON payload
    #[serde(skip)]
    pub files: Vec<FileAttachment>,
}

impl Message {
    /// Plain text message
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Plain text message visible only to the invoking user
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            flags: Some(EPHEMERAL_FLAG),
            ..Self::text(content)
        }
    }

    pub fn with_file(mut self, file: FileAttachment) -> Self {
        self.files.push(file);
        self
    }

    /// Attachment descriptors matching `files`, indexed in order
    pub fn attachment_refs(&self) -> Vec<AttachmentRef> {
        self.files
            .iter()
            .enumerate()
            .map(|(i, f)| AttachmentRef {
                id: i as u64,
                filename: f.file_name.clone(),
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
