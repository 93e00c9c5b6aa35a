//! OpenAI-Compatible SSE Stream Adapter
//!
//! Handles the `data: {...}` event-stream format spoken by OpenAI, Groq and
//! LM Studio. Reasoning models expose their chain of thought through
//! `delta.reasoning` (Groq) or `delta.reasoning_content` (LM Studio and
//! other OpenAI-compatible servers).

use serde::Deserialize;
use streamchat_core::streaming::{AdapterError, StreamAdapter, StreamEvent};

use super::provider_error_message;

#[derive(Debug, Deserialize)]
struct ChunkEvent {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    reasoning_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens_details: Option<CompletionDetails>,
}

#[derive(Debug, Deserialize)]
struct CompletionDetails {
    #[serde(default)]
    reasoning_tokens: Option<u32>,
}

impl Usage {
    /// A zero count means the provider did not report one.
    fn reasoning_tokens(&self) -> Option<u32> {
        self.reasoning_tokens
            .filter(|t| *t > 0)
            .or_else(|| {
                self.completion_tokens_details
                    .as_ref()
                    .and_then(|d| d.reasoning_tokens)
            })
            .filter(|t| *t > 0)
    }
}

/// Adapter for OpenAI-style chat completion chunks
pub struct OpenAiCompatAdapter {
    provider: &'static str,
    complete: bool,
}

impl OpenAiCompatAdapter {
    pub fn new(provider: &'static str) -> Self {
        Self {
            provider,
            complete: false,
        }
    }
}

impl StreamAdapter for OpenAiCompatAdapter {
    fn provider_name(&self) -> &'static str {
        self.provider
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<StreamEvent>, AdapterError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.starts_with(':') {
            return Ok(vec![]);
        }

        // Other SSE fields (event:, id:, retry:) carry nothing we consume
        let Some(payload) = trimmed.strip_prefix("data:") else {
            return Err(AdapterError::InvalidFormat(format!(
                "expected data field, got: {}",
                trimmed
            )));
        };
        let payload = payload.trim_start();

        if payload == "[DONE]" {
            self.complete = true;
            return Ok(vec![]);
        }

        let event: ChunkEvent =
            serde_json::from_str(payload).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        if let Some(error) = &event.error {
            return Err(AdapterError::ProviderReported(provider_error_message(error)));
        }

        let mut events = vec![];
        for choice in event.choices {
            let Some(delta) = choice.delta else { continue };

            let reasoning = delta.reasoning.or(delta.reasoning_content);
            if let Some(text) = reasoning.filter(|t| !t.is_empty()) {
                events.push(StreamEvent::reasoning(text));
            }
            if let Some(text) = delta.content.filter(|t| !t.is_empty()) {
                events.push(StreamEvent::answer(text));
            }
        }

        if let Some(tokens) = event.usage.as_ref().and_then(Usage::reasoning_tokens) {
            events.push(StreamEvent::usage(tokens));
        }

        Ok(events)
    }

    fn is_complete(&self) -> bool {
        self.complete
    }
}
