//! LLM Types
//!
//! Core types for provider interactions: provider identities, the canonical
//! conversation, per-provider configuration and the error model.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported chat backends.
///
/// Three remote APIs that need a credential and two local servers that do
/// not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderIdentity {
    #[serde(rename = "openai")]
    OpenAi,
    Groq,
    Gemini,
    Ollama,
    #[serde(rename = "lmstudio")]
    LmStudio,
}

impl ProviderIdentity {
    /// Every provider, in the order used for auto-selecting a model.
    pub const ALL: [ProviderIdentity; 5] = [
        ProviderIdentity::Groq,
        ProviderIdentity::OpenAi,
        ProviderIdentity::Gemini,
        ProviderIdentity::Ollama,
        ProviderIdentity::LmStudio,
    ];

    /// Stable lowercase key used in config files and credential stores.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderIdentity::OpenAi => "openai",
            ProviderIdentity::Groq => "groq",
            ProviderIdentity::Gemini => "gemini",
            ProviderIdentity::Ollama => "ollama",
            ProviderIdentity::LmStudio => "lmstudio",
        }
    }

    /// Human-readable name for messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderIdentity::OpenAi => "OpenAI",
            ProviderIdentity::Groq => "Groq",
            ProviderIdentity::Gemini => "Gemini",
            ProviderIdentity::Ollama => "Ollama",
            ProviderIdentity::LmStudio => "LM Studio",
        }
    }

    pub fn needs_credential(&self) -> bool {
        !self.is_local()
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ProviderIdentity::Ollama | ProviderIdentity::LmStudio)
    }

    /// Default API root; request paths are appended by each provider.
    pub fn base_endpoint(&self) -> &'static str {
        match self {
            ProviderIdentity::OpenAi => "https://api.openai.com/v1",
            ProviderIdentity::Groq => "https://api.groq.com/openai/v1",
            ProviderIdentity::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderIdentity::Ollama => "http://localhost:11434",
            ProviderIdentity::LmStudio => "http://localhost:1234/v1",
        }
    }

    /// Model used when the caller passes an empty model id.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderIdentity::OpenAi => "gpt-4o",
            ProviderIdentity::Groq => "llama-3.3-70b-versatile",
            ProviderIdentity::Gemini => "gemini-1.5-flash",
            ProviderIdentity::Ollama => "llama2",
            ProviderIdentity::LmStudio => "local-model",
        }
    }
}

impl std::fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderIdentity {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderIdentity::OpenAi),
            "groq" => Ok(ProviderIdentity::Groq),
            "gemini" | "google" => Ok(ProviderIdentity::Gemini),
            "ollama" => Ok(ProviderIdentity::Ollama),
            "lmstudio" | "lm-studio" | "lm_studio" => Ok(ProviderIdentity::LmStudio),
            other => Err(LlmError::UnknownProvider {
                name: other.to_string(),
            }),
        }
    }
}

/// Role of a turn in the canonical conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// One provider-agnostic conversation turn.
///
/// Role alternation is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Configuration for a single chat provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// The provider this config belongs to
    pub provider: ProviderIdentity,
    /// Opaque credential (not needed for local providers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider: ProviderIdentity) -> Self {
        Self {
            provider,
            api_key: None,
            base_url: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Credential, treating empty strings as absent.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Effective API root without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.provider.base_endpoint())
            .trim_end_matches('/')
    }
}

/// A model offered by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: ProviderIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ModelInfo {
    pub fn new(provider: ProviderIdentity, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider,
            context_window: None,
            owned_by: None,
            size: None,
        }
    }

    pub fn with_context_window(mut self, tokens: u32) -> Self {
        self.context_window = Some(tokens);
        self
    }
}

/// Error types for LLM operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmError {
    /// Required credential absent; raised before any network call
    MissingCredential { provider: String },
    /// Non-OK HTTP status or a network failure
    TransportFailure {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },
    /// Transport was fine but the provider reported an error in-band
    ProviderError { provider: String, message: String },
    /// A non-streamed response body could not be parsed
    ParseError { message: String },
    /// Request could not be built
    InvalidRequest { message: String },
    /// Provider identifier not recognized
    UnknownProvider { name: String },
    /// The caller cancelled the in-flight stream
    Cancelled,
}

impl LlmError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        LlmError::TransportFailure {
            message: err.to_string(),
            status: None,
        }
    }

    /// Whether the error came from the caller rather than the provider.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LlmError::Cancelled)
    }
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::MissingCredential { provider } => {
                write!(f, "{} API Key missing", provider)
            }
            LlmError::TransportFailure { message, status } => {
                if let Some(s) = status {
                    write!(f, "{} (HTTP {})", message, s)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            LlmError::ProviderError { provider, message } => {
                write!(f, "{} error: {}", provider, message)
            }
            LlmError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            LlmError::InvalidRequest { message } => {
                write!(f, "Invalid request: {}", message)
            }
            LlmError::UnknownProvider { name } => {
                write!(f, "Unknown provider: {}", name)
            }
            LlmError::Cancelled => write!(f, "Request cancelled"),
        }
    }
}

impl std::error::Error for LlmError {}

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;
