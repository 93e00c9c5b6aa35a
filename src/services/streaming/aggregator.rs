//! Stream Aggregator
//!
//! Drives one provider stream, folds its events into answer and reasoning
//! buffers and reports every forwarded event to the caller as it arrives.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use streamchat_core::streaming::StreamEvent;
use streamchat_llm::{ChatProvider, ConversationTurn, LlmResult};
use tokio_util::sync::CancellationToken;

/// Consolidated outcome of a completed stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResult {
    pub answer_text: String,
    pub reasoning_text: String,
    pub reasoning_tokens: u32,
    pub elapsed_ms: u64,
}

impl StreamResult {
    pub fn has_reasoning(&self) -> bool {
        !self.reasoning_text.is_empty()
    }
}

/// Running fold over stream events.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    answer: String,
    reasoning: String,
    reasoning_tokens: Option<u32>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the buffers.
    pub fn apply(&mut self, event: &StreamEvent) {
        if event.is_reasoning {
            self.reasoning.push_str(&event.text);
        } else {
            self.answer.push_str(&event.text);
        }
        // Zero is what providers send when they did not count
        if let Some(tokens) = event.reasoning_tokens.filter(|t| *t > 0) {
            self.reasoning_tokens = Some(tokens);
        }
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// Last reported count, or the reasoning length in characters when the
    /// provider never reported one.
    pub fn reasoning_tokens(&self) -> u32 {
        self.reasoning_tokens
            .unwrap_or_else(|| u32::try_from(self.reasoning.chars().count()).unwrap_or(u32::MAX))
    }

    pub fn finish(self, elapsed_ms: u64) -> StreamResult {
        let reasoning_tokens = self.reasoning_tokens();
        StreamResult {
            answer_text: self.answer,
            reasoning_text: self.reasoning,
            reasoning_tokens,
            elapsed_ms,
        }
    }
}

/// Runs a single streaming call to completion.
pub struct StreamAggregator;

impl StreamAggregator {
    /// Drive one `stream_chat` call.
    ///
    /// `on_event` sees every forwarded event in arrival order. On failure
    /// the error is returned and no result is produced; events already
    /// delivered stay delivered.
    pub async fn run<F>(
        provider: &dyn ChatProvider,
        conversation: &[ConversationTurn],
        model: &str,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> LlmResult<StreamResult>
    where
        F: FnMut(&StreamEvent) + Send,
    {
        let started = Instant::now();
        let mut acc = StreamAccumulator::new();

        let outcome = {
            let mut sink = |event: StreamEvent| {
                acc.apply(&event);
                on_event(&event);
            };
            provider
                .stream_chat(conversation, &mut sink, model, cancel)
                .await
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(()) => {
                tracing::info!(
                    provider = %provider.identity(),
                    answer_chars = acc.answer().len(),
                    reasoning_chars = acc.reasoning().len(),
                    elapsed_ms,
                    "stream complete"
                );
                Ok(acc.finish(elapsed_ms))
            }
            Err(e) => {
                tracing::debug!(provider = %provider.identity(), error = %e, elapsed_ms, "stream failed");
                Err(e)
            }
        }
    }
}
