//! Integration Tests Module
//!
//! End-to-end tests over scripted in-memory transports: provider streams
//! through the aggregator, artifact extraction on real answers, and full
//! chat turns through `ChatService`.

// Shared scripted transport and fake provider
mod support;

// Provider stream decoding and aggregation
mod streaming_test;

// Artifact extraction on aggregated answers
mod artifacts_test;

// Chat turns, search augmentation and persistence
mod chat_session_test;
