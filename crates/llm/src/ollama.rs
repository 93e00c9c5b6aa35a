//! Ollama Provider
//!
//! Local inference through Ollama's `/api/chat` endpoint. No credential is
//! needed; the stream is newline-delimited JSON.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::provider::{effective_model, open_stream, pump_stream, ChatProvider, EventSink};
use crate::streaming_adapters::OllamaAdapter;
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{ConversationTurn, LlmResult, ProviderConfig, ProviderIdentity};

/// Ollama provider
pub struct OllamaProvider {
    config: ProviderConfig,
    transport: Arc<dyn HttpTransport>,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    fn build_request_body(model: &str, conversation: &[ConversationTurn]) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = conversation
            .iter()
            .map(|turn| json!({ "role": turn.role.as_str(), "content": turn.content }))
            .collect();

        json!({
            "model": model,
            "messages": messages,
            "stream": true,
        })
    }
}

#[async_trait]
impl ChatProvider for OllamaProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::Ollama
    }

    async fn stream_chat(
        &self,
        conversation: &[ConversationTurn],
        on_event: &mut EventSink<'_>,
        model: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<()> {
        let model = effective_model(self.identity(), model);
        let url = format!("{}/api/chat", self.config.base_url());
        tracing::debug!(url = %url, model = %model, "ollama stream request");

        let request = HttpRequest::post_json(url, Self::build_request_body(&model, conversation));
        let response = open_stream(self.transport.as_ref(), self.identity(), request, cancel).await?;

        let mut adapter = OllamaAdapter::new();
        pump_stream(&mut adapter, response, on_event, cancel).await
    }
}
