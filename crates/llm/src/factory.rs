//! Provider Factory
//!
//! Maps a provider identity to its `ChatProvider` implementation.

use std::sync::Arc;

use crate::gemini::GeminiProvider;
use crate::groq::GroqProvider;
use crate::lmstudio::LmStudioProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;
use crate::provider::ChatProvider;
use crate::transport::HttpTransport;
use crate::types::{ProviderConfig, ProviderIdentity};

/// Factory for creating chat providers.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the provider for `config.provider`.
    pub fn create(config: ProviderConfig, transport: Arc<dyn HttpTransport>) -> Box<dyn ChatProvider> {
        match config.provider {
            ProviderIdentity::OpenAi => Box::new(OpenAiProvider::new(config, transport)),
            ProviderIdentity::Groq => Box::new(GroqProvider::new(config, transport)),
            ProviderIdentity::Gemini => Box::new(GeminiProvider::new(config, transport)),
            ProviderIdentity::Ollama => Box::new(OllamaProvider::new(config, transport)),
            ProviderIdentity::LmStudio => Box::new(LmStudioProvider::new(config, transport)),
        }
    }
}
