//! Canonical Stream Event Types
//!
//! Provider-agnostic event model and adapter trait for turning raw provider
//! stream frames into classified text fragments. Shared by the LLM crate
//! (provider adapters) and the application crate (aggregation, UI sinks).

use serde::{Deserialize, Serialize};

/// One decoded increment of a streamed response.
///
/// `text` lands in the answer buffer unless `is_reasoning` is set, in which
/// case it belongs to the reasoning/thinking buffer. Providers that report
/// reasoning-token usage attach it through `reasoning_tokens`, usually on a
/// final usage frame with no text at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    pub text: String,
    #[serde(default)]
    pub is_reasoning: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u32>,
}

impl StreamEvent {
    /// Visible answer text
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_reasoning: false,
            reasoning_tokens: None,
        }
    }

    /// Reasoning/thinking text
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_reasoning: true,
            reasoning_tokens: None,
        }
    }

    /// Usage-only update carrying a reasoning token count
    pub fn usage(reasoning_tokens: u32) -> Self {
        Self {
            text: String::new(),
            is_reasoning: false,
            reasoning_tokens: Some(reasoning_tokens),
        }
    }

    /// Attach a reasoning token count to this event.
    pub fn with_reasoning_tokens(mut self, tokens: Option<u32>) -> Self {
        self.reasoning_tokens = tokens;
        self
    }

    /// True when the event carries decoded text.
    pub fn is_fragment(&self) -> bool {
        !self.text.is_empty()
    }

    /// Events with neither text nor a token count are never delivered.
    pub fn is_forwardable(&self) -> bool {
        self.is_fragment() || self.reasoning_tokens.is_some()
    }
}

/// Errors raised while adapting a single stream frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AdapterError {
    /// Frame is structurally not what the provider framing expects
    InvalidFormat(String),
    /// Frame payload failed JSON parsing
    ParseError(String),
    /// Well-formed frame in which the provider reports an error
    ProviderReported(String),
}

impl AdapterError {
    /// Whether the frame should be dropped and the stream continued.
    pub fn is_skippable(&self) -> bool {
        !matches!(self, AdapterError::ProviderReported(_))
    }
}

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            AdapterError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AdapterError::ProviderReported(msg) => write!(f, "Provider error: {}", msg),
        }
    }
}

impl std::error::Error for AdapterError {}

/// Trait for adapting provider-specific stream frames to canonical events.
///
/// Adapters see one complete line at a time; chunk reassembly happens before
/// `adapt` is called.
pub trait StreamAdapter: Send + Sync {
    /// Returns the provider name for logging and identification.
    fn provider_name(&self) -> &'static str;

    /// Adapt one framed line to zero or more events.
    fn adapt(&mut self, input: &str) -> Result<Vec<StreamEvent>, AdapterError>;

    /// Whether the provider has sent its completion marker.
    fn is_complete(&self) -> bool {
        false
    }
}
