//! Provider-Specific Stream Adapters
//!
//! Each adapter handles the framing and field layout of its provider.

pub mod gemini;
pub mod ollama;
pub mod openai_compat;

pub use gemini::GeminiAdapter;
pub use ollama::OllamaAdapter;
pub use openai_compat::OpenAiCompatAdapter;

/// Extract a readable message from an in-band `error` value.
///
/// Providers send either a bare string or an object with a `message` field.
pub(crate) fn provider_error_message(error: &serde_json::Value) -> String {
    match error {
        serde_json::Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}
