//! Settings Models
//!
//! Application configuration and settings data structures.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use streamchat_core::proxy::ProxyConfig;
use streamchat_llm::ProviderIdentity;

/// Application configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Provider used for new messages
    #[serde(default = "default_provider")]
    pub selected_provider: ProviderIdentity,
    /// Model id; empty selects the provider default
    #[serde(default)]
    pub selected_model: String,
    /// Augment user messages with web search results
    #[serde(default)]
    pub search_enabled: bool,
    /// Per-provider API root overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub base_urls: BTreeMap<ProviderIdentity, String>,
    /// Outbound HTTP/SOCKS proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

fn default_provider() -> ProviderIdentity {
    ProviderIdentity::Groq
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            selected_provider: default_provider(),
            selected_model: String::new(),
            search_enabled: false,
            base_urls: BTreeMap::new(),
            proxy: None,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub selected_provider: Option<ProviderIdentity>,
    pub selected_model: Option<String>,
    pub search_enabled: Option<bool>,
    /// Entries to merge; an empty URL removes the override
    pub base_urls: Option<BTreeMap<ProviderIdentity, String>>,
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub clear_proxy: bool,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(provider) = update.selected_provider {
            self.selected_provider = provider;
        }
        if let Some(model) = update.selected_model {
            self.selected_model = model.trim().to_string();
        }
        if let Some(enabled) = update.search_enabled {
            self.search_enabled = enabled;
        }
        if let Some(urls) = update.base_urls {
            for (provider, url) in urls {
                if url.trim().is_empty() {
                    self.base_urls.remove(&provider);
                } else {
                    self.base_urls.insert(provider, url.trim().to_string());
                }
            }
        }
        if update.clear_proxy {
            self.proxy = None;
        } else if let Some(proxy) = update.proxy {
            self.proxy = Some(proxy);
        }
    }

    /// Base URL override for a provider, if any
    pub fn base_url(&self, provider: ProviderIdentity) -> Option<String> {
        self.base_urls.get(&provider).cloned()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (provider, url) in &self.base_urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!(
                    "Invalid base URL for {}: {}. Must start with http:// or https://",
                    provider, url
                ));
            }
        }

        if self.selected_model.chars().any(char::is_whitespace) {
            return Err(format!("Invalid model id: '{}'", self.selected_model));
        }

        if let Some(proxy) = &self.proxy {
            if proxy.host.trim().is_empty() {
                return Err("Proxy host cannot be empty".to_string());
            }
            if proxy.port == 0 {
                return Err("Proxy port cannot be 0".to_string());
            }
        }

        Ok(())
    }
}
