//! Public API for the queue system
//!
//! This module provides the complete public API for the broadcast queue
//! system. External modules should import from here rather than directly
//! from internal modules.
//! See module documentation for complete usage examples and architecture
//! details.

// Core queue components
pub use crate::queue::consumer::QueueConsumer;
pub use crate::queue::internal::BroadcastQueue;
pub use crate::queue::manager::QueueManager;
pub use crate::queue::publisher::QueuePublisher;

// Message types and utilities
pub use crate::queue::message::{Message, MessageHeader};

// Typed queue consumers for compile-time type safety
pub use crate::queue::typed::{TypedMessage, TypedQueueConsumer, TypedQueueManagerExt};

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

// Configuration, lifecycle and statistics
pub use crate::queue::types::{LagStats, Lifecycle, PublishOutcome, QueueConfig, QueueStats};
