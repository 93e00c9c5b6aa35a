//! Data Models
//!
//! Contains all data structures persisted or exchanged by the application.

pub mod artifact;
pub mod chat;
pub mod settings;

pub use artifact::*;
pub use chat::*;
pub use settings::*;
