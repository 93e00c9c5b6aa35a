//! Streamchat - Streaming LLM Chat Client Library
//!
//! This library provides the core of the streamchat client.
//! It includes:
//! - Stream aggregation over the provider stack in `streamchat-llm`
//! - Artifact extraction and web search augmentation
//! - Storage layer (chat history, credentials, JSON config)
//! - Data models and utilities

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export models
pub use models::artifact::{Artifact, ArtifactKind};
pub use models::chat::{Chat, ChatMessage};
pub use models::settings::{AppConfig, SettingsUpdate};
pub use services::chat::{ChatService, SendOutcome, SendOverrides};
pub use utils::error::{AppError, AppResult};
