//! Provider stream decoding and aggregation.

use std::sync::Arc;

use streamchat::services::streaming::StreamAggregator;
use streamchat_core::streaming::StreamEvent;
use streamchat_llm::{
    ConversationTurn, HttpTransport, LlmError, OllamaProvider, OpenAiProvider, ProviderConfig,
    ProviderFactory, ProviderIdentity,
};
use tokio_util::sync::CancellationToken;

use crate::support::{sse_content, sse_reasoning, FakeProvider, RoutedTransport, SSE_DONE};

fn hello() -> Vec<ConversationTurn> {
    vec![ConversationTurn::user("hello")]
}

async fn collect(
    provider: &dyn streamchat_llm::ChatProvider,
    cancel: &CancellationToken,
) -> (Result<streamchat::services::streaming::StreamResult, LlmError>, Vec<StreamEvent>) {
    let mut events = Vec::new();
    let result = StreamAggregator::run(provider, &hello(), "", cancel, |e| events.push(e.clone())).await;
    (result, events)
}

#[tokio::test]
async fn test_fragments_split_into_answer_and_reasoning() {
    let provider = FakeProvider::new(&[("f1", false), ("f2", true), ("f3", false)]);
    let (result, events) = collect(&provider, &CancellationToken::new()).await;
    let result = result.unwrap();

    assert_eq!(result.answer_text, "f1f3");
    assert_eq!(result.reasoning_text, "f2");
    let order: Vec<(&str, bool)> = events
        .iter()
        .map(|e| (e.text.as_str(), e.is_reasoning))
        .collect();
    assert_eq!(order, vec![("f1", false), ("f2", true), ("f3", false)]);
    assert_eq!(provider.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sse_hello_across_chunks() {
    let he = sse_content("He");
    let llo = sse_content("llo");
    let transport = RoutedTransport::new()
        .route("/chat/completions", 200, &[&he, &llo, SSE_DONE])
        .build();
    let provider = OpenAiProvider::new(
        ProviderConfig::new(ProviderIdentity::OpenAi).with_api_key("sk-test"),
        transport.clone(),
    );

    let (result, events) = collect(&provider, &CancellationToken::new()).await;
    let result = result.unwrap();
    assert_eq!(result.answer_text, "Hello");
    assert_eq!(result.reasoning_text, "");
    assert_eq!(events.len(), 2);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_empty_fragments_never_forwarded() {
    let empty = sse_content("");
    let a = sse_content("A");
    let transport = RoutedTransport::new()
        .route("/chat/completions", 200, &[&empty, &a, &empty, SSE_DONE])
        .build();
    let provider = ProviderFactory::create(
        ProviderConfig::new(ProviderIdentity::Groq).with_api_key("gsk-test"),
        transport,
    );

    let (result, events) = collect(provider.as_ref(), &CancellationToken::new()).await;
    assert_eq!(result.unwrap().answer_text, "A");
    assert_eq!(events.len(), 1);
    assert!(events.iter().all(|e| !e.text.is_empty()));
}

#[tokio::test]
async fn test_ndjson_object_split_across_chunks() {
    let transport = RoutedTransport::new()
        .route(
            "/api/chat",
            200,
            &[
                "{\"message\":{\"role\":\"assistant\",\"con",
                "tent\":\"Hi there\"},\"done\":false}\n",
            ],
        )
        .build();
    let provider = OllamaProvider::new(ProviderConfig::new(ProviderIdentity::Ollama), transport);

    let (result, events) = collect(&provider, &CancellationToken::new()).await;
    assert_eq!(result.unwrap().answer_text, "Hi there");
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_malformed_line_skipped() {
    let transport = RoutedTransport::new()
        .route(
            "/api/chat",
            200,
            &[
                "{\"message\":{\"content\":\"one \"},\"done\":false}\n",
                "not json\n",
                "{\"message\":{\"content\":\"two\"},\"done\":false}\n",
            ],
        )
        .build();
    let provider = OllamaProvider::new(ProviderConfig::new(ProviderIdentity::Ollama), transport);

    let (result, events) = collect(&provider, &CancellationToken::new()).await;
    assert_eq!(result.unwrap().answer_text, "one two");
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn test_missing_credential_makes_no_request() {
    let transport = RoutedTransport::new()
        .route("/chat/completions", 200, &[SSE_DONE])
        .build();
    let provider = OpenAiProvider::new(ProviderConfig::new(ProviderIdentity::OpenAi), transport.clone());

    let (result, events) = collect(&provider, &CancellationToken::new()).await;
    match result {
        Err(LlmError::MissingCredential { provider }) => assert_eq!(provider, "OpenAI"),
        other => panic!("Expected MissingCredential, got {:?}", other),
    }
    assert!(events.is_empty());
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_reasoning_tokens_fall_back_to_length() {
    let think = sse_reasoning("abcd");
    let answer = sse_content("ok");
    let transport = RoutedTransport::new()
        .route("/chat/completions", 200, &[&think, &answer, SSE_DONE])
        .build();
    let provider = ProviderFactory::create(
        ProviderConfig::new(ProviderIdentity::Groq).with_api_key("gsk-test"),
        transport,
    );

    let (result, _) = collect(provider.as_ref(), &CancellationToken::new()).await;
    let result = result.unwrap();
    assert_eq!(result.reasoning_text, "abcd");
    assert_eq!(result.reasoning_tokens, 4);
    assert!(result.has_reasoning());
}

#[tokio::test]
async fn test_zero_usage_frame_keeps_length_fallback() {
    let think = sse_reasoning("abcd");
    let answer = sse_content("ok");
    let usage = "data: {\"choices\":[],\"usage\":{\"completion_tokens\":6,\"completion_tokens_details\":{\"reasoning_tokens\":0}}}\n\n";
    let transport = RoutedTransport::new()
        .route("/chat/completions", 200, &[&think, &answer, usage, SSE_DONE])
        .build();
    let provider = OpenAiProvider::new(
        ProviderConfig::new(ProviderIdentity::OpenAi).with_api_key("sk-test"),
        transport,
    );

    let (result, events) = collect(&provider, &CancellationToken::new()).await;
    let result = result.unwrap();
    assert_eq!(result.reasoning_text, "abcd");
    assert_eq!(result.reasoning_tokens, 4);
    assert_eq!(events.len(), 2);
}

#[tokio::test]
async fn test_in_band_error_frame_ends_stream() {
    let a = sse_content("partial");
    let error = "data: {\"error\":{\"message\":\"rate limited\"}}\n\n";
    let transport = RoutedTransport::new()
        .route("/chat/completions", 200, &[&a, error, SSE_DONE])
        .build();
    let provider = ProviderFactory::create(
        ProviderConfig::new(ProviderIdentity::Groq).with_api_key("gsk-test"),
        transport,
    );

    let (result, events) = collect(provider.as_ref(), &CancellationToken::new()).await;
    match result {
        Err(LlmError::ProviderError { message, .. }) => assert_eq!(message, "rate limited"),
        other => panic!("Expected ProviderError, got {:?}", other),
    }
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_non_ok_status_uses_body_message() {
    let transport = RoutedTransport::new()
        .route(
            "/chat/completions",
            401,
            &["{\"error\":{\"message\":\"Invalid API Key\"}}"],
        )
        .build();
    let provider = ProviderFactory::create(
        ProviderConfig::new(ProviderIdentity::Groq).with_api_key("bad"),
        transport,
    );

    let (result, _) = collect(provider.as_ref(), &CancellationToken::new()).await;
    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "Invalid API Key (HTTP 401)");
}

#[tokio::test]
async fn test_unreachable_local_provider_gets_hint() {
    let transport: Arc<dyn HttpTransport> = RoutedTransport::new().build();
    let provider = ProviderFactory::create(ProviderConfig::new(ProviderIdentity::LmStudio), transport);

    let (result, _) = collect(provider.as_ref(), &CancellationToken::new()).await;
    let message = result.unwrap_err().to_string();
    assert!(message.contains("is LM Studio running"), "{}", message);
}

#[tokio::test]
async fn test_cancelled_before_first_chunk() {
    let a = sse_content("never");
    let transport = RoutedTransport::new()
        .route("/chat/completions", 200, &[&a, SSE_DONE])
        .build();
    let provider = ProviderFactory::create(
        ProviderConfig::new(ProviderIdentity::OpenAi).with_api_key("sk-test"),
        transport,
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let (result, events) = collect(provider.as_ref(), &cancel).await;
    assert!(matches!(result, Err(LlmError::Cancelled)));
    assert!(events.is_empty());
}
