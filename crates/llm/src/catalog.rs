//! Model Catalog
//!
//! Lists the models each provider offers. OpenAI and Gemini use built-in
//! lists; Groq, Ollama and LM Studio are queried live and the results are
//! cached per provider.

use std::sync::Arc;
use std::time::Duration;

use mini_moka::sync::Cache;
use serde::Deserialize;

use crate::provider::transport_failure;
use crate::transport::{HttpRequest, HttpTransport};
use crate::types::{LlmError, LlmResult, ModelInfo, ProviderConfig, ProviderIdentity};

/// Default lifetime of a discovery result (5 minutes)
pub const MODEL_CACHE_TTL_SECS: u64 = 300;

/// Context window assumed when Groq does not report one
const GROQ_DEFAULT_CONTEXT: u32 = 8192;

const OPENAI_MODELS: &[(&str, &str, u32)] = &[
    ("gpt-4o", "GPT-4o", 128_000),
    ("gpt-4o-mini", "GPT-4o Mini", 128_000),
    ("gpt-4-turbo", "GPT-4 Turbo", 128_000),
    ("gpt-4", "GPT-4", 8_192),
    ("gpt-3.5-turbo", "GPT-3.5 Turbo", 16_385),
];

const GEMINI_MODELS: &[(&str, &str, u32)] = &[
    ("gemini-2.0-flash-exp", "Gemini 2.0 Flash (Experimental)", 1_000_000),
    ("gemini-1.5-pro", "Gemini 1.5 Pro", 2_000_000),
    ("gemini-1.5-flash", "Gemini 1.5 Flash", 1_000_000),
    ("gemini-pro", "Gemini Pro", 32_768),
];

#[derive(Debug, Deserialize)]
struct OpenAiModelList {
    #[serde(default)]
    data: Vec<OpenAiModelEntry>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModelEntry {
    id: String,
    #[serde(default)]
    owned_by: Option<String>,
    #[serde(default)]
    context_window: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaTag {
    name: String,
    #[serde(default)]
    size: Option<u64>,
}

/// Per-provider TTL cache of discovered models.
#[derive(Clone)]
pub struct ModelCache {
    inner: Cache<ProviderIdentity, Arc<Vec<ModelInfo>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(MODEL_CACHE_TTL_SECS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(ProviderIdentity::ALL.len() as u64)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    pub fn get(&self, provider: ProviderIdentity) -> Option<Arc<Vec<ModelInfo>>> {
        self.inner.get(&provider)
    }

    pub fn insert(&self, provider: ProviderIdentity, models: Vec<ModelInfo>) {
        self.inner.insert(provider, Arc::new(models));
    }

    /// Drop one provider's entry, or every entry when `provider` is `None`.
    pub fn invalidate(&self, provider: Option<ProviderIdentity>) {
        match provider {
            Some(p) => self.inner.invalidate(&p),
            None => self.inner.invalidate_all(),
        }
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Model discovery across all providers
pub struct ModelCatalog {
    transport: Arc<dyn HttpTransport>,
    cache: ModelCache,
}

impl ModelCatalog {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_cache(transport, ModelCache::new())
    }

    pub fn with_cache(transport: Arc<dyn HttpTransport>, cache: ModelCache) -> Self {
        Self { transport, cache }
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }

    /// Built-in list for providers without a discovery endpoint.
    pub fn static_models(provider: ProviderIdentity) -> Vec<ModelInfo> {
        let table = match provider {
            ProviderIdentity::OpenAi => OPENAI_MODELS,
            ProviderIdentity::Gemini => GEMINI_MODELS,
            _ => return Vec::new(),
        };
        table
            .iter()
            .map(|(id, name, window)| {
                ModelInfo::new(provider, *id, *name).with_context_window(*window)
            })
            .collect()
    }

    /// Fetch the models for one provider, consulting the cache first.
    pub async fn fetch_models(&self, config: &ProviderConfig) -> LlmResult<Vec<ModelInfo>> {
        let provider = config.provider;
        match provider {
            ProviderIdentity::OpenAi | ProviderIdentity::Gemini => {
                return Ok(Self::static_models(provider));
            }
            _ => {}
        }

        if let Some(cached) = self.cache.get(provider) {
            tracing::debug!(provider = %provider, "model list served from cache");
            return Ok(cached.as_ref().clone());
        }

        let models = match provider {
            ProviderIdentity::Groq => self.discover_groq(config).await?,
            ProviderIdentity::Ollama => self.discover_ollama(config).await?,
            _ => self.discover_lmstudio(config).await?,
        };

        self.cache.insert(provider, models.clone());
        Ok(models)
    }

    /// Like [`fetch_models`](Self::fetch_models), but failures yield an
    /// empty list.
    pub async fn list_models(&self, config: &ProviderConfig) -> Vec<ModelInfo> {
        match self.fetch_models(config).await {
            Ok(models) => models,
            Err(LlmError::MissingCredential { .. }) => Vec::new(),
            Err(e) => {
                tracing::warn!(provider = %config.provider, error = %e, "model discovery failed");
                Vec::new()
            }
        }
    }

    /// Gather models from every provider. Remote providers contribute only
    /// when their credential is configured.
    pub async fn all_models(&self, configs: &[ProviderConfig]) -> Vec<ModelInfo> {
        let mut all = Vec::new();
        for config in configs {
            if config.provider.needs_credential() && config.credential().is_none() {
                continue;
            }
            all.extend(self.list_models(config).await);
        }
        all
    }

    pub fn invalidate(&self, provider: Option<ProviderIdentity>) {
        self.cache.invalidate(provider);
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        provider: ProviderIdentity,
        request: HttpRequest,
    ) -> LlmResult<T> {
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            let status = response.status;
            let body = response.text().await.unwrap_or_default();
            return Err(transport_failure(provider, status, &body));
        }
        response.json().await
    }

    async fn discover_groq(&self, config: &ProviderConfig) -> LlmResult<Vec<ModelInfo>> {
        let api_key = config
            .credential()
            .ok_or_else(|| crate::provider::missing_credential_error(ProviderIdentity::Groq))?;
        let request = HttpRequest::get(format!("{}/models", config.base_url())).bearer(api_key);
        let list: OpenAiModelList = self.get_json(ProviderIdentity::Groq, request).await?;

        Ok(list
            .data
            .into_iter()
            .map(|m| ModelInfo {
                name: m.id.clone(),
                id: m.id,
                provider: ProviderIdentity::Groq,
                context_window: Some(m.context_window.unwrap_or(GROQ_DEFAULT_CONTEXT)),
                owned_by: m.owned_by,
                size: None,
            })
            .collect())
    }

    async fn discover_ollama(&self, config: &ProviderConfig) -> LlmResult<Vec<ModelInfo>> {
        let request = HttpRequest::get(format!("{}/api/tags", config.base_url()));
        let tags: OllamaTags = self.get_json(ProviderIdentity::Ollama, request).await?;

        Ok(tags
            .models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.clone(),
                name: m.name,
                provider: ProviderIdentity::Ollama,
                context_window: None,
                owned_by: None,
                size: m.size,
            })
            .collect())
    }

    async fn discover_lmstudio(&self, config: &ProviderConfig) -> LlmResult<Vec<ModelInfo>> {
        let request = HttpRequest::get(format!("{}/models", config.base_url()));
        let list: OpenAiModelList = self.get_json(ProviderIdentity::LmStudio, request).await?;

        Ok(list
            .data
            .into_iter()
            .map(|m| ModelInfo {
                name: m.id.clone(),
                id: m.id,
                provider: ProviderIdentity::LmStudio,
                context_window: m.context_window,
                owned_by: m.owned_by,
                size: None,
            })
            .collect())
    }
}
