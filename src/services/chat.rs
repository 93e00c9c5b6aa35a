//! Chat Session Service
//!
//! Ties the stores, the model catalog and the provider stack together to
//! run one chat turn: record the user message, optionally augment it with
//! web search, stream the reply and persist the outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use streamchat_core::streaming::StreamEvent;
use streamchat_llm::{
    ConversationTurn, HttpTransport, ModelCatalog, ModelInfo, ProviderConfig, ProviderFactory,
    ProviderIdentity,
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::models::artifact::Artifact;
use crate::models::chat::ChatMessage;
use crate::models::settings::{AppConfig, SettingsUpdate};
use crate::services::artifacts::extract_with_placeholder;
use crate::services::search::{augment_message, TavilyClient};
use crate::services::streaming::{StreamAggregator, StreamResult};
use crate::storage::{ChatStore, ConfigService, CredentialStore, TAVILY_KEY};
use crate::utils::error::{AppError, AppResult};

/// Per-invocation overrides of the saved settings
#[derive(Debug, Clone, Default)]
pub struct SendOverrides {
    pub provider: Option<ProviderIdentity>,
    pub model: Option<String>,
    pub search: Option<bool>,
}

/// Outcome of a completed turn
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// Assistant message as stored (artifact block replaced by placeholder)
    pub message: ChatMessage,
    pub artifact: Option<Artifact>,
    pub result: StreamResult,
}

/// Clears the in-flight flag when the turn ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> AppResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Chat session driver
pub struct ChatService {
    chats: Arc<RwLock<ChatStore>>,
    credentials: Arc<RwLock<CredentialStore>>,
    config: Arc<RwLock<ConfigService>>,
    catalog: ModelCatalog,
    transport: Arc<dyn HttpTransport>,
    in_flight: AtomicBool,
    search_endpoint: Option<String>,
}

impl ChatService {
    /// Open every store at its default location
    pub fn new(transport: Arc<dyn HttpTransport>) -> AppResult<Self> {
        Ok(Self::from_parts(
            ChatStore::new()?,
            CredentialStore::new()?,
            ConfigService::new()?,
            transport,
        ))
    }

    pub fn from_parts(
        chats: ChatStore,
        credentials: CredentialStore,
        config: ConfigService,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            chats: Arc::new(RwLock::new(chats)),
            credentials: Arc::new(RwLock::new(credentials)),
            config: Arc::new(RwLock::new(config)),
            catalog: ModelCatalog::new(transport.clone()),
            transport,
            in_flight: AtomicBool::new(false),
            search_endpoint: None,
        }
    }

    /// Point web search at a different endpoint
    pub fn with_search_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.search_endpoint = Some(endpoint.into());
        self
    }

    pub fn chats(&self) -> &Arc<RwLock<ChatStore>> {
        &self.chats
    }

    pub fn credentials(&self) -> &Arc<RwLock<CredentialStore>> {
        &self.credentials
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn get_config(&self) -> AppConfig {
        self.config.read().await.get_config().clone()
    }

    pub async fn update_config(&self, update: SettingsUpdate) -> AppResult<AppConfig> {
        self.config.write().await.update_config(update)
    }

    /// Provider settings with the stored credential and base URL override
    pub async fn provider_config(&self, provider: ProviderIdentity) -> ProviderConfig {
        let mut config = ProviderConfig::new(provider);
        if let Some(key) = self.credentials.read().await.for_provider(provider) {
            config = config.with_api_key(key);
        }
        if let Some(url) = self.config.read().await.get_config().base_url(provider) {
            config = config.with_base_url(url);
        }
        config
    }

    /// Models offered by `provider`; failures yield an empty list
    pub async fn list_models(&self, provider: ProviderIdentity) -> Vec<ModelInfo> {
        let config = self.provider_config(provider).await;
        self.catalog.list_models(&config).await
    }

    /// Models across every provider that is usable with current keys
    pub async fn all_models(&self) -> Vec<ModelInfo> {
        let mut configs = Vec::with_capacity(ProviderIdentity::ALL.len());
        for provider in ProviderIdentity::ALL {
            configs.push(self.provider_config(provider).await);
        }
        self.catalog.all_models(&configs).await
    }

    /// Drop cached discovery results and fetch again
    pub async fn refresh_models(&self, provider: Option<ProviderIdentity>) -> Vec<ModelInfo> {
        self.catalog.invalidate(provider);
        match provider {
            Some(p) => self.list_models(p).await,
            None => self.all_models().await,
        }
    }

    /// Switch provider. When the selected model is not offered by the new
    /// provider, its first listed model is selected instead.
    pub async fn select_provider(&self, provider: ProviderIdentity) -> AppResult<AppConfig> {
        let current_model = self.get_config().await.selected_model;
        let models = self.list_models(provider).await;

        let selected_model = if models.iter().any(|m| m.id == current_model) {
            current_model
        } else {
            models.first().map(|m| m.id.clone()).unwrap_or_default()
        };

        self.update_config(SettingsUpdate {
            selected_provider: Some(provider),
            selected_model: Some(selected_model),
            ..Default::default()
        })
        .await
    }

    pub async fn select_model(&self, model: impl Into<String>) -> AppResult<AppConfig> {
        self.update_config(SettingsUpdate {
            selected_model: Some(model.into()),
            ..Default::default()
        })
        .await
    }

    /// Send a message with the saved settings
    pub async fn send_message<F>(
        &self,
        text: &str,
        cancel: &CancellationToken,
        on_event: F,
    ) -> AppResult<SendOutcome>
    where
        F: FnMut(&StreamEvent) + Send,
    {
        self.send_message_with(text, &SendOverrides::default(), cancel, on_event)
            .await
    }

    /// Send a message, overriding provider, model or search for this turn.
    ///
    /// The stored user message is the text as typed; only the turn sent to
    /// the provider carries search context. On failure the error is stored
    /// inline as the assistant reply, except when the turn was cancelled.
    pub async fn send_message_with<F>(
        &self,
        text: &str,
        overrides: &SendOverrides,
        cancel: &CancellationToken,
        on_event: F,
    ) -> AppResult<SendOutcome>
    where
        F: FnMut(&StreamEvent) + Send,
    {
        if text.trim().is_empty() {
            return Err(AppError::validation("Message is empty"));
        }
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let settings = self.get_config().await;
        let provider = overrides.provider.unwrap_or(settings.selected_provider);
        let model = match &overrides.model {
            Some(m) => m.clone(),
            None if provider == settings.selected_provider => settings.selected_model.clone(),
            None => String::new(),
        };
        let search_enabled = overrides.search.unwrap_or(settings.search_enabled);

        let history = {
            let mut chats = self.chats.write().await;
            let history = chats.current().conversation();
            chats.add_message(ChatMessage::user(text));
            history
        };

        let content = self.augment(text, search_enabled).await;
        let mut conversation = history;
        conversation.push(ConversationTurn::user(content));

        let provider_config = self.provider_config(provider).await;
        let chat_provider = ProviderFactory::create(provider_config, self.transport.clone());

        tracing::debug!(provider = %provider, model = %model, turns = conversation.len(), "sending message");
        let outcome =
            StreamAggregator::run(chat_provider.as_ref(), &conversation, &model, cancel, on_event)
                .await;

        match outcome {
            Ok(result) => Ok(self.record_reply(result).await),
            Err(e) => {
                if !e.is_cancelled() {
                    self.chats
                        .write()
                        .await
                        .add_message(ChatMessage::assistant(format!("Error: {}", e)));
                }
                Err(e.into())
            }
        }
    }

    async fn augment(&self, text: &str, search_enabled: bool) -> String {
        if !search_enabled {
            return text.to_string();
        }
        let key = self
            .credentials
            .read()
            .await
            .get(TAVILY_KEY)
            .map(str::to_string);
        let Some(key) = key else {
            tracing::debug!("web search enabled but no Tavily key configured");
            return text.to_string();
        };

        let mut client = TavilyClient::new(self.transport.clone(), key);
        if let Some(endpoint) = &self.search_endpoint {
            client = client.with_endpoint(endpoint.clone());
        }
        augment_message(&client, text).await
    }

    async fn record_reply(&self, result: StreamResult) -> SendOutcome {
        let extraction = extract_with_placeholder(&result.answer_text);

        let mut message = ChatMessage::assistant(extraction.display_text);
        if result.has_reasoning() {
            message = message.with_thinking(
                result.reasoning_text.clone(),
                result.reasoning_tokens,
                result.elapsed_ms,
            );
        }

        let mut chats = self.chats.write().await;
        if let Some(artifact) = &extraction.artifact {
            chats.add_artifact(artifact.clone());
        }
        chats.add_message(message.clone());

        SendOutcome {
            message,
            artifact: extraction.artifact,
            result,
        }
    }
}
