//! Chat Provider Trait
//!
//! Defines the common interface for all chat backends and the decode loop
//! they share.

use async_trait::async_trait;
use futures_util::StreamExt;
use streamchat_core::streaming::{AdapterError, StreamAdapter, StreamEvent};
use tokio_util::sync::CancellationToken;

use crate::framing::LineBuffer;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::{ConversationTurn, LlmError, LlmResult, ProviderIdentity};

/// Callback receiving each forwarded event, in arrival order.
pub type EventSink<'a> = dyn FnMut(StreamEvent) + Send + 'a;

/// Trait that all chat providers implement.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Which backend this provider talks to.
    fn identity(&self) -> ProviderIdentity;

    /// Stream a chat completion for `conversation`.
    ///
    /// Every decoded fragment is handed to `on_event` as it arrives. Resolves
    /// once the transport ends or the provider sends its completion marker.
    /// An empty `model` selects the provider default.
    async fn stream_chat(
        &self,
        conversation: &[ConversationTurn],
        on_event: &mut EventSink<'_>,
        model: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<()>;
}

/// Resolve an empty model id to the provider default.
pub fn effective_model(identity: ProviderIdentity, model: &str) -> String {
    let model = model.trim();
    if model.is_empty() {
        identity.default_model().to_string()
    } else {
        model.to_string()
    }
}

/// Helper function to create an error for a missing credential
pub fn missing_credential_error(identity: ProviderIdentity) -> LlmError {
    LlmError::MissingCredential {
        provider: identity.display_name().to_string(),
    }
}

/// Text used when a failed response carries no readable error message.
pub fn fallback_error_text(identity: ProviderIdentity) -> &'static str {
    match identity {
        ProviderIdentity::OpenAi => "OpenAI API Error",
        ProviderIdentity::Groq => "Groq API Error",
        ProviderIdentity::Gemini => "Gemini API Error",
        ProviderIdentity::Ollama => "Ollama API Error - is Ollama running?",
        ProviderIdentity::LmStudio => {
            "LM Studio API Error - is LM Studio running with a model loaded?"
        }
    }
}

/// Helper function to turn a non-OK response body into a transport failure.
///
/// Uses `error.message` or a string `error` from the body when present.
pub fn transport_failure(identity: ProviderIdentity, status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            // Gemini wraps error bodies in a one-element array
            let v = match v {
                serde_json::Value::Array(items) => items.into_iter().next()?,
                other => other,
            };
            let error = v.get("error")?;
            error
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| error.as_str())
                .map(str::to_string)
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback_error_text(identity).to_string());

    LlmError::TransportFailure {
        message,
        status: Some(status),
    }
}

/// Send a streaming request, mapping non-OK statuses to errors.
pub async fn open_stream(
    transport: &dyn HttpTransport,
    identity: ProviderIdentity,
    request: HttpRequest,
    cancel: &CancellationToken,
) -> LlmResult<HttpResponse> {
    let sent = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(LlmError::Cancelled),
        sent = transport.send(request) => sent,
    };

    let response = match sent {
        Ok(response) => response,
        Err(LlmError::TransportFailure { message, status: None }) if identity.is_local() => {
            return Err(LlmError::TransportFailure {
                message: format!("{}: {}", fallback_error_text(identity), message),
                status: None,
            });
        }
        Err(e) => return Err(e),
    };

    if !response.is_success() {
        let status = response.status;
        let body = response.text().await.unwrap_or_default();
        return Err(transport_failure(identity, status, &body));
    }

    Ok(response)
}

/// Run the decode loop: frame the body into lines, adapt each line and
/// forward the resulting events.
///
/// Unparseable frames are logged and dropped. An in-band provider error
/// ends the stream with [`LlmError::ProviderError`].
pub async fn pump_stream(
    adapter: &mut dyn StreamAdapter,
    response: HttpResponse,
    on_event: &mut EventSink<'_>,
    cancel: &CancellationToken,
) -> LlmResult<()> {
    let mut body = response.body;
    let mut lines = LineBuffer::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            next = body.next() => next,
        };

        let Some(chunk) = next else { break };
        let chunk = chunk?;

        for line in lines.push(&chunk) {
            dispatch_line(adapter, &line, on_event)?;
            if adapter.is_complete() {
                tracing::debug!(provider = adapter.provider_name(), "completion marker received");
                return Ok(());
            }
        }
    }

    if let Some(rest) = lines.finish() {
        dispatch_line(adapter, &rest, on_event)?;
    }

    Ok(())
}

fn dispatch_line(
    adapter: &mut dyn StreamAdapter,
    line: &str,
    on_event: &mut EventSink<'_>,
) -> LlmResult<()> {
    match adapter.adapt(line) {
        Ok(events) => {
            for event in events.into_iter().filter(StreamEvent::is_forwardable) {
                on_event(event);
            }
            Ok(())
        }
        Err(AdapterError::ProviderReported(message)) => Err(LlmError::ProviderError {
            provider: adapter.provider_name().to_string(),
            message,
        }),
        Err(e) => {
            tracing::debug!(provider = adapter.provider_name(), error = %e, "skipping frame");
            Ok(())
        }
    }
}
