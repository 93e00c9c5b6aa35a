//! LM Studio Provider
//!
//! LM Studio's local server exposes an OpenAI-compatible API. No credential
//! is sent; the model id defaults to whatever model is loaded.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::openai::chat_completions_body;
use crate::provider::{effective_model, open_stream, pump_stream, ChatProvider, EventSink};
use crate::streaming_adapters::OpenAiCompatAdapter;
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{ConversationTurn, LlmResult, ProviderConfig, ProviderIdentity};

/// LM Studio provider
pub struct LmStudioProvider {
    config: ProviderConfig,
    transport: Arc<dyn HttpTransport>,
}

impl LmStudioProvider {
    pub fn new(config: ProviderConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }
}

#[async_trait]
impl ChatProvider for LmStudioProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::LmStudio
    }

    async fn stream_chat(
        &self,
        conversation: &[ConversationTurn],
        on_event: &mut EventSink<'_>,
        model: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<()> {
        let model = effective_model(self.identity(), model);
        let url = format!("{}/chat/completions", self.config.base_url());
        tracing::debug!(url = %url, model = %model, "lmstudio stream request");

        let request = HttpRequest::post_json(url, chat_completions_body(&model, conversation, false));
        let response = open_stream(self.transport.as_ref(), self.identity(), request, cancel).await?;

        let mut adapter = OpenAiCompatAdapter::new(self.identity().as_str());
        pump_stream(&mut adapter, response, on_event, cancel).await
    }
}
