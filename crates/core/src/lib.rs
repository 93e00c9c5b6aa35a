//! streamchat Core
//!
//! Foundational types shared by the streamchat workspace. This crate has no
//! knowledge of HTTP, providers or persistence.
//!
//! ## Module Organization
//!
//! - `streaming` - Canonical stream events, adapter trait, adapter errors
//! - `proxy` - Proxy configuration data types shared across HTTP clients

pub mod proxy;
pub mod streaming;

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::{AdapterError, StreamAdapter, StreamEvent};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};
