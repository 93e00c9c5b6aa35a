//! Stream Aggregation
//!
//! Folds provider events into the answer and reasoning buffers of a single
//! response.

pub mod aggregator;

// Re-export main types
pub use aggregator::{StreamAccumulator, StreamAggregator, StreamResult};
