//! Core records exchanged with the surrounding chat application.

use serde::{Deserialize, Serialize};

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Role name on the provider wire (OpenAI-style).
    pub fn as_provider_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One turn of conversation history, supplied read-only by the caller.
/// Insertion order is chronological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    /// Persona that produced an assistant turn, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            persona_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            persona_id: None,
        }
    }

    pub fn with_persona(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = Some(persona_id.into());
        self
    }
}

/// The active system prompt: instruction text that sets the assistant's tone.
/// At most one persona is active at a time; lifecycle is owned by the host's
/// configuration store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    /// System-instruction text sent as the first provider message.
    pub content: String,
    pub is_active: bool,
}

/// The unit returned to the caller, and the unit stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiReply {
    pub content: String,
    #[serde(default)]
    pub persona_id: Option<String>,
}

impl AiReply {
    pub fn new(content: impl Into<String>, persona_id: Option<String>) -> Self {
        Self {
            content: content.into(),
            persona_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_to_provider_names() {
        assert_eq!(ChatRole::User.as_provider_str(), "user");
        assert_eq!(ChatRole::Assistant.as_provider_str(), "assistant");
    }

    #[test]
    fn turn_roles_serialize_screaming() {
        let json = serde_json::to_string(&ChatTurn::user("hola")).unwrap();
        assert!(json.contains("\"USER\""));
    }

    #[test]
    fn reply_roundtrips_through_json() {
        let reply = AiReply::new("hola", Some("p1".into()));
        let bytes = serde_json::to_vec(&reply).unwrap();
        let back: AiReply = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, reply);
    }
}
