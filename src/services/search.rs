//! Web Search Augmentation
//!
//! Pluggable web search used to prepend fresh context to a user message.
//! Tavily is the only backend. Search is best-effort: a failed search
//! leaves the message as typed.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use streamchat_llm::{HttpRequest, HttpTransport, LlmError, LlmResult};

/// Tavily search endpoint
pub const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

const TAVILY_MAX_RESULTS: u32 = 5;

/// A search result entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
}

/// Search response: an optional synthesized answer plus ranked results
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// Trait for pluggable search providers
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for display
    fn name(&self) -> &str;

    /// Execute a search query
    async fn search(&self, query: &str) -> LlmResult<SearchResponse>;
}

/// Tavily search provider (requires API key)
pub struct TavilyClient {
    transport: Arc<dyn HttpTransport>,
    api_key: String,
    endpoint: String,
}

impl TavilyClient {
    pub fn new(transport: Arc<dyn HttpTransport>, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            endpoint: TAVILY_SEARCH_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    fn name(&self) -> &str {
        "Tavily"
    }

    async fn search(&self, query: &str) -> LlmResult<SearchResponse> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::MissingCredential {
                provider: "Tavily".to_string(),
            });
        }

        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "search_depth": "basic",
            "include_answer": true,
            "max_results": TAVILY_MAX_RESULTS,
        });

        let response = self
            .transport
            .send(HttpRequest::post_json(&self.endpoint, body))
            .await?;

        if !response.is_success() {
            let status = response.status;
            let err_body = response.text().await.unwrap_or_default();
            tracing::debug!(status, body = %err_body, "tavily error body");
            return Err(LlmError::TransportFailure {
                message: "Tavily Search Failed".to_string(),
                status: Some(status),
            });
        }

        response.json().await
    }
}

/// Format search results as the context block appended to a message.
pub fn format_context(results: &[SearchResult]) -> LlmResult<String> {
    let json = serde_json::to_string(results).map_err(|e| LlmError::ParseError {
        message: e.to_string(),
    })?;
    Ok(format!("\n\nWeb Search Results:\n{}", json))
}

/// Append web search context to `message`.
///
/// Any search failure is logged and the message is returned unchanged.
pub async fn augment_message(provider: &dyn SearchProvider, message: &str) -> String {
    let context = match provider.search(message).await {
        Ok(response) => format_context(&response.results),
        Err(e) => Err(e),
    };

    match context {
        Ok(context) => format!("{}\n\nContext from Web Search:{}", message, context),
        Err(e) => {
            tracing::warn!(provider = provider.name(), error = %e, "web search failed, sending message without context");
            message.to_string()
        }
    }
}
