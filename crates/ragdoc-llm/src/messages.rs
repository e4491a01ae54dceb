use ragdoc_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// A chat turn. Serializes to the OpenAI wire shape `{"role": .., "content": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant(String),
}

impl ChatMessage {
    pub fn content(&self) -> &str {
        match self {
            Self::System(c) | Self::User(c) | Self::Assistant(c) => c,
        }
    }
}

/// Loosely-shaped inbound message: a bare string or a `{role, content}` record.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMessage {
    Text(String),
    Record { role: String, content: String },
}

impl TryFrom<RawMessage> for ChatMessage {
    type Error = Error;

    fn try_from(raw: RawMessage) -> Result<Self> {
        match raw {
            RawMessage::Text(content) => Ok(Self::User(content)),
            RawMessage::Record { role, content } => match role.to_ascii_lowercase().as_str() {
                "system" => Ok(Self::System(content)),
                "user" | "human" => Ok(Self::User(content)),
                "assistant" | "ai" => Ok(Self::Assistant(content)),
                other => Err(Error::InvalidInput(format!("unknown message role '{}'", other))),
            },
        }
    }
}

pub fn normalize_messages(raw: Vec<RawMessage>) -> Result<Vec<ChatMessage>> {
    if raw.is_empty() { return Err(Error::InvalidInput("at least one message is required".into())); }
    raw.into_iter().map(ChatMessage::try_from).collect()
}

/// System prompt first (when non-blank), then web-search context, then the conversation.
pub fn compose_messages(system_prompt: &str, search_context: Option<String>, conversation: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(conversation.len() + 2);
    if !system_prompt.trim().is_empty() { out.push(ChatMessage::System(system_prompt.to_string())); }
    if let Some(context) = search_context { out.push(ChatMessage::System(context)); }
    out.extend(conversation);
    out
}

pub fn last_user_message(messages: &[ChatMessage]) -> Option<&str> {
    messages.iter().rev().find_map(|m| match m {
        ChatMessage::User(c) => Some(c.as_str()),
        _ => None,
    })
}
