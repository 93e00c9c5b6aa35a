//! Gemini Provider
//!
//! Streams from `models/{model}:streamGenerateContent`. The API key travels
//! in the query string, and the canonical `assistant` role is sent as
//! `model`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::provider::{
    effective_model, missing_credential_error, open_stream, pump_stream, ChatProvider, EventSink,
};
use crate::streaming_adapters::GeminiAdapter;
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{
    ConversationTurn, LlmError, LlmResult, ProviderConfig, ProviderIdentity, TurnRole,
};

/// Gemini provider
pub struct GeminiProvider {
    config: ProviderConfig,
    transport: Arc<dyn HttpTransport>,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Build the stream URL with the key as a query parameter.
    fn stream_url(&self, model: &str, api_key: &str) -> LlmResult<url::Url> {
        let raw = format!(
            "{}/models/{}:streamGenerateContent",
            self.config.base_url(),
            model
        );
        let mut url = url::Url::parse(&raw).map_err(|e| LlmError::InvalidRequest {
            message: format!("Invalid Gemini URL {}: {}", raw, e),
        })?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    fn build_request_body(conversation: &[ConversationTurn]) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = conversation
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    TurnRole::Assistant => "model",
                    TurnRole::User => "user",
                };
                json!({ "role": role, "parts": [{ "text": turn.content }] })
            })
            .collect();

        json!({ "contents": contents })
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::Gemini
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
        let url = self.stream_url(&model, api_key)?;
        tracing::debug!(base = %self.config.base_url(), model = %model, "gemini stream request");

        let request = HttpRequest::post_json(url.to_string(), Self::build_request_body(conversation));
        let response = open_stream(self.transport.as_ref(), self.identity(), request, cancel).await?;

        let mut adapter = GeminiAdapter::new();
        pump_stream(&mut adapter, response, on_event, cancel).await
    }
}
