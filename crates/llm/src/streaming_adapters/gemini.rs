//! Gemini NDJSON Stream Adapter
//!
//! `streamGenerateContent` emits one `GenerateContentResponse` object per
//! line, possibly wrapped in the punctuation of an enclosing JSON array.
//! Each object must fit on a single line: a pretty-printed array whose
//! objects span several lines decodes to nothing.
//! Parts flagged with `thought: true` are the model's thinking summary.

use serde::Deserialize;
use streamchat_core::streaming::{AdapterError, StreamAdapter, StreamEvent};

use super::provider_error_message;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    thoughts_token_count: Option<u32>,
}

/// Adapter for Gemini's streamed JSON objects
#[derive(Default)]
pub struct GeminiAdapter {
    complete: bool,
}

impl GeminiAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Strip the `[`, `,` and `]` that surround objects in the streamed array.
fn strip_array_punctuation(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| c == '[' || c == ',' || c.is_whitespace())
        .trim_end_matches(|c: char| c == ']' || c == ',' || c.is_whitespace())
}

impl StreamAdapter for GeminiAdapter {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn adapt(&mut self, input: &str) -> Result<Vec<StreamEvent>, AdapterError> {
        let json_str = strip_array_punctuation(input);
        if json_str.is_empty() {
            return Ok(vec![]);
        }

        let response: GenerateResponse =
            serde_json::from_str(json_str).map_err(|e| AdapterError::ParseError(e.to_string()))?;

        if let Some(error) = &response.error {
            return Err(AdapterError::ProviderReported(provider_error_message(error)));
        }

        let mut events = vec![];

        // Only the first candidate is rendered
        if let Some(candidate) = response.candidates.into_iter().next() {
            for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
                let Some(text) = part.text.filter(|t| !t.is_empty()) else {
                    continue;
                };
                if part.thought {
                    events.push(StreamEvent::reasoning(text));
                } else {
                    events.push(StreamEvent::answer(text));
                }
            }
            if candidate.finish_reason.is_some() {
                self.complete = true;
            }
        }

        if let Some(tokens) = response
            .usage_metadata
            .and_then(|u| u.thoughts_token_count)
            .filter(|t| *t > 0)
        {
            events.push(StreamEvent::usage(tokens));
        }

        Ok(events)
    }

    fn is_complete(&self) -> bool {
        self.complete
    }
}
