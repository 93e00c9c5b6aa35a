//! Test doubles shared by the integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use streamchat_core::streaming::StreamEvent;
use streamchat_llm::{
    ChatProvider, ConversationTurn, EventSink, HttpRequest, HttpResponse, HttpTransport, LlmError,
    LlmResult, ProviderIdentity,
};
use tokio_util::sync::CancellationToken;

struct Route {
    url_fragment: String,
    status: u16,
    chunks: Vec<String>,
}

/// Answers each request from the first route whose fragment occurs in the
/// URL. Unrouted requests fail like a refused connection.
#[derive(Default)]
pub struct RoutedTransport {
    routes: Vec<Route>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RoutedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url_fragment: &str, status: u16, chunks: &[&str]) -> Self {
        self.routes.push(Route {
            url_fragment: url_fragment.to_string(),
            status,
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests_to(&self, url_fragment: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(url_fragment))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for RoutedTransport {
    async fn send(&self, request: HttpRequest) -> LlmResult<HttpResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        let route = self
            .routes
            .iter()
            .find(|r| url.contains(&r.url_fragment))
            .ok_or_else(|| LlmError::network(format!("connection refused: {}", url)))?;

        let items: Vec<LlmResult<Bytes>> = route
            .chunks
            .iter()
            .map(|c| Ok(Bytes::from(c.clone())))
            .collect();
        Ok(HttpResponse::new(route.status, stream::iter(items).boxed()))
    }
}

/// Provider that replays a fixed list of `(text, is_reasoning)` fragments.
pub struct FakeProvider {
    fragments: Vec<(String, bool)>,
    pub seen: Mutex<Vec<ConversationTurn>>,
}

impl FakeProvider {
    pub fn new(fragments: &[(&str, bool)]) -> Self {
        Self {
            fragments: fragments
                .iter()
                .map(|(t, r)| (t.to_string(), *r))
                .collect(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatProvider for FakeProvider {
    fn identity(&self) -> ProviderIdentity {
        ProviderIdentity::Groq
    }

    async fn stream_chat(
        &self,
        conversation: &[ConversationTurn],
        on_event: &mut EventSink<'_>,
        _model: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<()> {
        *self.seen.lock().unwrap() = conversation.to_vec();
        for (text, is_reasoning) in &self.fragments {
            if cancel.is_cancelled() {
                return Err(LlmError::Cancelled);
            }
            let event = if *is_reasoning {
                StreamEvent::reasoning(text.clone())
            } else {
                StreamEvent::answer(text.clone())
            };
            on_event(event);
        }
        Ok(())
    }
}

/// One SSE `data:` frame carrying an answer delta.
pub fn sse_content(text: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"delta": {"content": text}}]})
    )
}

/// One SSE `data:` frame carrying a reasoning delta.
pub fn sse_reasoning(text: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"delta": {"reasoning": text}}]})
    )
}

pub const SSE_DONE: &str = "data: [DONE]\n\n";
