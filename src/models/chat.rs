//! Chat Models
//!
//! Persisted chats and their messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use streamchat_llm::{ConversationTurn, TurnRole};

use super::artifact::Artifact;

/// Title given to chats before their first user message
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Maximum title length taken from the first user message
pub const TITLE_MAX_CHARS: usize = 50;

/// One message in a chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Reasoning text shown alongside the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_tokens: Option<u32>,
    /// Wall-clock duration of the streamed response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ChatMessage {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            thinking: None,
            thinking_tokens: None,
            duration_ms: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }

    /// Attach reasoning metadata.
    pub fn with_thinking(mut self, thinking: String, tokens: u32, duration_ms: u64) -> Self {
        self.thinking = Some(thinking);
        self.thinking_tokens = Some(tokens);
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn to_turn(&self) -> ConversationTurn {
        ConversationTurn {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// A conversation with its messages and artifacts (newest artifact first)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Chat {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: DEFAULT_CHAT_TITLE.to_string(),
            messages: Vec::new(),
            artifacts: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Conversation history as provider turns
    pub fn conversation(&self) -> Vec<ConversationTurn> {
        self.messages.iter().map(ChatMessage::to_turn).collect()
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}

/// Title derived from a chat's first user message.
pub fn title_from_message(content: &str) -> String {
    if content.chars().count() > TITLE_MAX_CHARS {
        let head: String = content.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}
