//! Scripted transport for provider unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};

use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::LlmResult;

/// Replies with a fixed status and body chunks, recording every request.
pub struct ScriptedTransport {
    status: u16,
    chunks: Vec<String>,
    pub requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub fn new(status: u16, chunks: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            status,
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            requests: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> LlmResult<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        let items: Vec<LlmResult<Bytes>> = self
            .chunks
            .iter()
            .map(|c| Ok(Bytes::from(c.clone())))
            .collect();
        Ok(HttpResponse::new(self.status, stream::iter(items).boxed()))
    }
}
