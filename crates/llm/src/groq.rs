//! Groq Provider
//!
//! Groq serves an OpenAI-compatible API; reasoning models stream their
//! thinking through `delta.reasoning`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::openai::chat_completions_body;
use crate::provider::{
    effective_model, missing_credential_error, open_stream, pump_stream, ChatProvider, EventSink,
};
use crate::streaming_adapters::OpenAiCompatAdapter;
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{ConversationTurn, LlmResult, ProviderConfig, ProviderIdentity};

/// Groq provider
pub struct GroqProvider {
    config: ProviderConfig,
    transport: Arc<dyn HttpTransport>,
}

impl GroqProvider {
    pub fn new(config: ProviderConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }
}

#[async_trait]
impl ChatProvider for GroqProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::Groq
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
        let url = format!("{}/chat/completions", self.config.base_url());
        tracing::debug!(url = %url, model = %model, "groq stream request");

        let request =
            HttpRequest::post_json(url, chat_completions_body(&model, conversation, false))
                .bearer(api_key);
        let response = open_stream(self.transport.as_ref(), self.identity(), request, cancel).await?;

        let mut adapter = OpenAiCompatAdapter::new(self.identity().as_str());
        pump_stream(&mut adapter, response, on_event, cancel).await
    }
}
