//! Storage Layer
//!
//! Handles all data persistence: chat history, credentials and JSON config.

pub mod chats;
pub mod config;
pub mod credentials;

pub use chats::*;
pub use config::*;
pub use credentials::*;
