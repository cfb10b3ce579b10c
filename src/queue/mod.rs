//! Bounded Broadcast Queue Component
//!
//! An in-process, bounded-capacity, multi-subscriber broadcast queue:
//! publishers insert messages, and every currently-registered subscriber
//! receives every message published while it is subscribed, in publish
//! order, exactly once.
//!
//! # Overview
//!
//! Key properties:
//!
//! - **Broadcast delivery**: each message carries a pending-receiver
//!   count set at publish time; it is freed exactly when the last
//!   intended recipient has consumed it, unsubscribed, or cancelled it
//! - **Backpressure**: the chain is bounded; publishers block while it
//!   is full instead of dropping messages
//! - **Blocking reads**: subscribers park while fully caught up and are
//!   woken by the next publish
//! - **Dynamic membership**: subscribe/unsubscribe at any time without
//!   corrupting in-flight delivery state
//! - **Cancellation and resizing**: a specific unconsumed message can be
//!   removed out of band, and the capacity can be changed live
//! - **Race-free shutdown**: closing drains every parked publisher and
//!   subscriber before the backlog is discarded
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Publisher A  │     │ Publisher B  │     │ Publisher C  │
//! └──────┬───────┘     └──────┬───────┘     └──────┬───────┘
//!        │ publish            │ publish            │ publish
//!        ▼                    ▼                    ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                      QueueManager                       │
//! │  ┌───────────────────────────────────────────────────┐  │
//! │  │          BroadcastQueue (bounded chain)           │  │
//! │  │   ┌────┬────┬────┬────┬────┬────┬────┬────┐      │  │
//! │  │   │ 41 │ 42 │ 43 │ 44 │ 45 │ 46 │ 47 │ 48 │      │  │
//! │  │   └────┴────┴────┴────┴────┴────┴────┴────┘      │  │
//! │  │      ▲         ▲                   ▲              │  │
//! │  │      │ cursor  │ cursor            │ cursor       │  │
//! │  └──────┼─────────┼───────────────────┼──────────────┘  │
//! └─────────┼─────────┼───────────────────┼─────────────────┘
//!           │ recv    │ recv              │ recv
//!  ┌────────┴──┐ ┌────┴──────┐ ┌──────────┴┐
//!  │Consumer A │ │Consumer B │ │Consumer C │  (independent cursors)
//!  └───────────┘ └───────────┘ └───────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use fanout::queue::{Message, QueueManager};
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Arc::new(QueueManager::new());
//!
//! // Create a publisher
//! let publisher = manager.create_publisher("my-service".to_string())?;
//!
//! // Create a consumer; it only sees messages published from now on
//! let consumer = manager.create_consumer("my-worker".to_string())?;
//!
//! // Publish messages
//! publisher.publish(Message::new(
//!     "my-service".to_string(),
//!     "event_type".to_string(),
//!     "message data".to_string(),
//! ))?;
//!
//! // Read messages
//! while let Some(msg) = consumer.try_recv()? {
//!     println!("Received: {}", msg.data);
//! }
//!
//! // Drain and tear down
//! manager.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! The generic core, [`BroadcastQueue`], is usable directly when the
//! `Message` envelope and handle layer are not needed.

pub mod api;
mod consumer;
mod error;
mod internal;
mod manager;
mod message;
mod publisher;
mod typed;
mod types;

pub use consumer::QueueConsumer;
pub use error::{QueueError, QueueResult};
pub use internal::BroadcastQueue;
pub use manager::QueueManager;
pub use message::{Message, MessageHeader};
pub use publisher::QueuePublisher;
pub use typed::{TypedMessage, TypedQueueConsumer, TypedQueueManagerExt};
pub use types::{LagStats, Lifecycle, PublishOutcome, QueueConfig, QueueStats};

#[cfg(test)]
mod tests;
