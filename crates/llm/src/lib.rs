//! Streamchat LLM
//!
//! Provides a unified streaming interface over several chat backends:
//! - OpenAI
//! - Groq
//! - Gemini
//! - Ollama (local inference)
//! - LM Studio (local inference)
//!
//! Also includes the HTTP transport seam, line framing, provider-specific
//! stream adapters and the model catalog.

pub mod catalog;
pub mod factory;
pub mod framing;
pub mod gemini;
pub mod groq;
pub mod http_client;
pub mod lmstudio;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod streaming_adapters;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use catalog::{ModelCache, ModelCatalog};
pub use factory::ProviderFactory;
pub use framing::LineBuffer;
pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use http_client::build_http_client;
pub use lmstudio::LmStudioProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::{ChatProvider, EventSink};
pub use transport::{ByteStream, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::*;

// Re-export streaming adapters
pub use streaming_adapters::{GeminiAdapter, OllamaAdapter, OpenAiCompatAdapter};
