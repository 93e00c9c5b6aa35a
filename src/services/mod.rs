//! Services
//!
//! Business logic services for the application.
//! Services handle the core functionality and are called by the CLI.

pub mod artifacts;
pub mod chat;
pub mod search;
pub mod streaming;

pub use artifacts::{extract_artifact, extract_with_placeholder, Extraction};
pub use chat::{ChatService, SendOutcome, SendOverrides};
pub use search::{augment_message, SearchProvider, SearchResponse, SearchResult, TavilyClient};
pub use streaming::{StreamAccumulator, StreamAggregator, StreamResult};
