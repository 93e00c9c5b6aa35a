//! Chat turns through `ChatService`: history, search, artifacts and errors.

use std::sync::Arc;

use async_trait::async_trait;
use streamchat::models::chat::DEFAULT_CHAT_TITLE;
use streamchat::services::chat::{ChatService, SendOverrides};
use streamchat::storage::{ChatStore, ConfigService, CredentialStore, TAVILY_KEY};
use streamchat::{AppError, SettingsUpdate};
use streamchat_llm::{
    HttpRequest, HttpResponse, HttpTransport, LlmError, LlmResult, ProviderIdentity, TurnRole,
};
use tempfile::TempDir;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::support::{sse_content, sse_reasoning, RoutedTransport, SSE_DONE};

struct Harness {
    service: ChatService,
    _dir: TempDir,
}

fn harness(
    transport: Arc<dyn HttpTransport>,
    keys: &[(&str, &str)],
    update: SettingsUpdate,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ConfigService::open(dir.path().join("config.json")).unwrap();
    config.update_config(update).unwrap();
    let mut credentials = CredentialStore::open(dir.path().join("credentials.json")).unwrap();
    for (name, value) in keys {
        credentials.set(name, value).unwrap();
    }
    let chats = ChatStore::open(dir.path().join("chat_history.json"));

    Harness {
        service: ChatService::from_parts(chats, credentials, config, transport),
        _dir: dir,
    }
}

fn groq_reply(chunks: &[&str]) -> Arc<RoutedTransport> {
    RoutedTransport::new()
        .route("api.groq.com", 200, chunks)
        .build()
}

fn last_user_content(request: &HttpRequest) -> String {
    let messages = request.body.as_ref().unwrap()["messages"].as_array().unwrap().clone();
    messages.last().unwrap()["content"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_turn_stores_reply_artifact_and_thinking() {
    let think = sse_reasoning("plan it");
    let answer = sse_content("Sure:\n```html\n<p>hi</p>\n```\nDone.");
    let transport = groq_reply(&[&think, &answer, SSE_DONE]);
    let h = harness(transport.clone(), &[("groq", "gsk-test")], SettingsUpdate::default());

    let mut forwarded = 0;
    let outcome = h
        .service
        .send_message("Build a page", &CancellationToken::new(), |_| forwarded += 1)
        .await
        .unwrap();
    assert_eq!(forwarded, 2);

    let artifact = outcome.artifact.clone().unwrap();
    assert_eq!(artifact.content, "<p>hi</p>\n");
    assert!(outcome
        .message
        .content
        .contains(&format!(":::artifact{{id=\"{}\"", artifact.id)));
    assert_eq!(outcome.message.thinking.as_deref(), Some("plan it"));
    assert_eq!(outcome.message.thinking_tokens, Some(7));
    assert!(outcome.message.duration_ms.is_some());

    let chats = h.service.chats().read().await;
    let chat = chats.current();
    assert_eq!(chat.title, "Build a page");
    assert_eq!(chat.messages.len(), 2);
    assert_eq!(chat.messages[0].role, TurnRole::User);
    assert_eq!(chat.messages[1].content, outcome.message.content);
    assert_eq!(chat.artifacts.len(), 1);
    assert_eq!(chat.artifacts[0].id, artifact.id);
}

#[tokio::test]
async fn test_reply_without_reasoning_has_no_thinking() {
    let answer = sse_content("plain");
    let transport = groq_reply(&[&answer, SSE_DONE]);
    let h = harness(transport, &[("groq", "gsk-test")], SettingsUpdate::default());

    let outcome = h
        .service
        .send_message("hi", &CancellationToken::new(), |_| {})
        .await
        .unwrap();
    assert_eq!(outcome.message.content, "plain");
    assert!(outcome.message.thinking.is_none());
    assert!(outcome.message.thinking_tokens.is_none());
    assert!(outcome.artifact.is_none());
}

#[tokio::test]
async fn test_history_is_sent_with_new_turn() {
    let answer = sse_content("reply");
    let transport = groq_reply(&[&answer, SSE_DONE]);
    let h = harness(transport.clone(), &[("groq", "gsk-test")], SettingsUpdate::default());
    let cancel = CancellationToken::new();

    h.service.send_message("first", &cancel, |_| {}).await.unwrap();
    h.service.send_message("second", &cancel, |_| {}).await.unwrap();

    let requests = transport.requests_to("/chat/completions");
    assert_eq!(requests.len(), 2);
    let messages = requests[1].body.as_ref().unwrap()["messages"].as_array().unwrap().clone();
    let roles: Vec<&str> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
    assert_eq!(roles, vec!["user", "assistant", "user"]);
    assert_eq!(messages[1]["content"], "reply");
    assert_eq!(messages[2]["content"], "second");
}

#[tokio::test]
async fn test_search_context_sent_but_not_stored() {
    let answer = sse_content("ok");
    let transport = RoutedTransport::new()
        .route(
            "api.tavily.com",
            200,
            &[r#"{"answer":"A","results":[{"title":"T","url":"https://u","content":"C","score":0.5}]}"#],
        )
        .route("api.groq.com", 200, &[&answer, SSE_DONE])
        .build();
    let h = harness(
        transport.clone(),
        &[("groq", "gsk-test"), (TAVILY_KEY, "tvly-test")],
        SettingsUpdate {
            search_enabled: Some(true),
            ..Default::default()
        },
    );

    h.service
        .send_message("rust news", &CancellationToken::new(), |_| {})
        .await
        .unwrap();

    let search = transport.requests_to("api.tavily.com");
    assert_eq!(search.len(), 1);
    let body = search[0].body.as_ref().unwrap();
    assert_eq!(body["query"], "rust news");
    assert_eq!(body["api_key"], "tvly-test");
    assert_eq!(body["max_results"], 5);

    let sent = last_user_content(&transport.requests_to("api.groq.com")[0]);
    assert_eq!(
        sent,
        "rust news\n\nContext from Web Search:\n\nWeb Search Results:\n[{\"title\":\"T\",\"content\":\"C\",\"url\":\"https://u\"}]"
    );

    let chats = h.service.chats().read().await;
    assert_eq!(chats.current().messages[0].content, "rust news");
}

#[tokio::test]
async fn test_search_failure_is_not_fatal() {
    let answer = sse_content("still here");
    let transport = RoutedTransport::new()
        .route("api.tavily.com", 500, &["boom"])
        .route("api.groq.com", 200, &[&answer, SSE_DONE])
        .build();
    let h = harness(
        transport.clone(),
        &[("groq", "gsk-test"), (TAVILY_KEY, "tvly-test")],
        SettingsUpdate::default(),
    );
    let overrides = SendOverrides {
        search: Some(true),
        ..Default::default()
    };

    let outcome = h
        .service
        .send_message_with("question", &overrides, &CancellationToken::new(), |_| {})
        .await
        .unwrap();
    assert_eq!(outcome.message.content, "still here");
    assert_eq!(transport.requests_to("api.tavily.com").len(), 1);
    assert_eq!(last_user_content(&transport.requests_to("api.groq.com")[0]), "question");
}

#[tokio::test]
async fn test_search_skipped_without_key() {
    let answer = sse_content("ok");
    let transport = groq_reply(&[&answer, SSE_DONE]);
    let h = harness(
        transport.clone(),
        &[("groq", "gsk-test")],
        SettingsUpdate {
            search_enabled: Some(true),
            ..Default::default()
        },
    );

    h.service
        .send_message("q", &CancellationToken::new(), |_| {})
        .await
        .unwrap();
    assert!(transport.requests_to("tavily").is_empty());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_missing_key_stored_as_error_reply() {
    let transport = groq_reply(&[SSE_DONE]);
    let h = harness(transport.clone(), &[], SettingsUpdate::default());

    let err = h
        .service
        .send_message("hello", &CancellationToken::new(), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Llm(LlmError::MissingCredential { .. })));
    assert_eq!(transport.calls(), 0);

    let chats = h.service.chats().read().await;
    let messages = &chats.current().messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, TurnRole::Assistant);
    assert_eq!(messages[1].content, "Error: Groq API Key missing");
}

#[tokio::test]
async fn test_cancelled_turn_stores_no_reply() {
    let answer = sse_content("never");
    let transport = groq_reply(&[&answer, SSE_DONE]);
    let h = harness(transport, &[("groq", "gsk-test")], SettingsUpdate::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = h.service.send_message("hello", &cancel, |_| {}).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(!h.service.is_busy());

    let chats = h.service.chats().read().await;
    assert_eq!(chats.current().messages.len(), 1);
}

#[tokio::test]
async fn test_blank_message_rejected() {
    let transport = groq_reply(&[SSE_DONE]);
    let h = harness(transport.clone(), &[("groq", "gsk-test")], SettingsUpdate::default());

    let err = h
        .service
        .send_message("   \n", &CancellationToken::new(), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(transport.calls(), 0);

    let chats = h.service.chats().read().await;
    assert!(chats.current().messages.is_empty());
    assert_eq!(chats.current().title, DEFAULT_CHAT_TITLE);
}

/// Holds every request until released.
struct GatedTransport {
    inner: Arc<RoutedTransport>,
    gate: Arc<Notify>,
}

#[async_trait]
impl HttpTransport for GatedTransport {
    async fn send(&self, request: HttpRequest) -> LlmResult<HttpResponse> {
        self.gate.notified().await;
        self.inner.send(request).await
    }
}

#[tokio::test]
async fn test_second_send_while_streaming_is_busy() {
    let answer = sse_content("first");
    let gate = Arc::new(Notify::new());
    let transport = Arc::new(GatedTransport {
        inner: groq_reply(&[&answer, SSE_DONE]),
        gate: gate.clone(),
    });
    let h = harness(transport, &[("groq", "gsk-test")], SettingsUpdate::default());
    let cancel = CancellationToken::new();

    let (first, second, _) = tokio::join!(
        h.service.send_message("one", &cancel, |_| {}),
        h.service.send_message("two", &cancel, |_| {}),
        async { gate.notify_one() },
    );

    assert_eq!(first.unwrap().message.content, "first");
    assert!(matches!(second, Err(AppError::Busy)));
    assert!(!h.service.is_busy());
}

#[tokio::test]
async fn test_select_provider_picks_first_offered_model() {
    let transport = RoutedTransport::new()
        .route(
            "/api/tags",
            200,
            &[r#"{"models":[{"name":"llama3:8b","size":1},{"name":"qwen2:7b","size":2}]}"#],
        )
        .build();
    let h = harness(
        transport,
        &[],
        SettingsUpdate {
            selected_model: Some("gpt-4o".to_string()),
            ..Default::default()
        },
    );

    let config = h.service.select_provider(ProviderIdentity::Ollama).await.unwrap();
    assert_eq!(config.selected_provider, ProviderIdentity::Ollama);
    assert_eq!(config.selected_model, "llama3:8b");

    h.service.select_model("qwen2:7b").await.unwrap();
    let config = h.service.select_provider(ProviderIdentity::Ollama).await.unwrap();
    assert_eq!(config.selected_model, "qwen2:7b");
}

#[tokio::test]
async fn test_history_survives_reopen() {
    let answer = sse_content("persisted");
    let transport = groq_reply(&[&answer, SSE_DONE]);
    let h = harness(transport, &[("groq", "gsk-test")], SettingsUpdate::default());

    h.service
        .send_message("remember me", &CancellationToken::new(), |_| {})
        .await
        .unwrap();

    let reopened = ChatStore::open(h._dir.path().join("chat_history.json"));
    let chat = reopened.current();
    assert_eq!(chat.title, "remember me");
    assert_eq!(chat.messages.len(), 2);
    assert_eq!(chat.messages[1].content, "persisted");
}
