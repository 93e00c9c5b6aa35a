//! OpenAI Provider
//!
//! Streams chat completions from OpenAI's `/chat/completions` endpoint. The
//! request builder here is shared with the other OpenAI-compatible
//! providers (Groq, LM Studio).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::provider::{
    effective_model, missing_credential_error, open_stream, pump_stream, ChatProvider, EventSink,
};
use crate::streaming_adapters::OpenAiCompatAdapter;
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{ConversationTurn, LlmResult, ProviderConfig, ProviderIdentity};

/// Build a streamed `/chat/completions` request body.
pub(crate) fn chat_completions_body(
    model: &str,
    conversation: &[ConversationTurn],
    include_usage: bool,
) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = conversation
        .iter()
        .map(|turn| json!({ "role": turn.role.as_str(), "content": turn.content }))
        .collect();

    let mut body = json!({
        "model": model,
        "messages": messages,
        "stream": true,
    });
    if include_usage {
        body["stream_options"] = json!({ "include_usage": true });
    }
    body
}

/// OpenAI provider
pub struct OpenAiProvider {
    config: ProviderConfig,
    transport: Arc<dyn HttpTransport>,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url())
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::OpenAi
    }

    async fn stream_chat(
        &self,
        conversation: &[ConversationTurn],
        on_event: &mut EventSink<'_>,
        model: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<()> {
        let api_key = self
            .config
            .credential()
            .ok_or_else(|| missing_credential_error(self.identity()))?;

        let model = effective_model(self.identity(), model);
        let request = HttpRequest::post_json(
            self.endpoint(),
            chat_completions_body(&model, conversation, true),
        )
        .bearer(api_key);

        tracing::debug!(url = %self.endpoint(), model = %model, "openai stream request");
        let response = open_stream(self.transport.as_ref(), self.identity(), request, cancel).await?;

        let mut adapter = OpenAiCompatAdapter::new(self.identity().as_str());
        pump_stream(&mut adapter, response, on_event, cancel).await
    }
}
