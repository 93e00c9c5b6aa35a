//! Ollama Stream Adapter
//!
//! Handles the `/api/chat` NDJSON format. Thinking-capable models put their
//! reasoning in `message.thinking`; the final object carries `done: true`.

use serde::Deserialize;
use streamchat_core::streaming::{AdapterError, StreamAdapter, StreamEvent};

#[derive(Debug, Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    thinking: Option<String>,
}

/// Adapter for Ollama chat chunks
#[derive(Default)]
pub struct OllamaAdapter {
    complete: bool,
}

impl OllamaAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamAdapter for OllamaAdapter {
    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<StreamEvent>, AdapterError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(vec![]);
        }

        let chunk: OllamaChunk =
            serde_json::from_str(trimmed).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        if let Some(error) = chunk.error {
            return Err(AdapterError::ProviderReported(error));
        }

        let mut events = vec![];
        if let Some(message) = chunk.message {
            if let Some(thinking) = message.thinking.filter(|t| !t.is_empty()) {
                events.push(StreamEvent::reasoning(thinking));
            }
            if let Some(content) = message.content.filter(|t| !t.is_empty()) {
                events.push(StreamEvent::answer(content));
            }
        }

        if chunk.done {
            self.complete = true;
        }

        Ok(events)
    }

    fn is_complete(&self) -> bool {
        self.complete
    }
}
