//! QueueManager - Central coordination for the broadcast queue
//!
//! The QueueManager serves as the central coordination point for all queue
//! operations. It owns a single broadcast queue that all producers publish
//! to and all consumers read from, with each consumer holding its own
//! registry slot and read cursor.

use crate::queue::consumer::QueueConsumer;
use crate::queue::internal::BroadcastQueue;
use crate::queue::message::Message;
use crate::queue::publisher::QueuePublisher;
use crate::queue::types::{LagStats, QueueConfig, QueueStats};
use crate::queue::QueueResult;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Central queue manager providing producer/consumer coordination
///
/// The QueueManager is responsible for:
/// - Creating and managing publishers and consumers
/// - Allocating unique subscriber identities so handle users can never
///   collide in the registry
/// - Exposing queue statistics and backlog monitoring
/// - Running the drain-then-teardown shutdown sequence
///
/// # Thread Safety
///
/// The QueueManager is fully thread-safe and is shared across threads as
/// `Arc<QueueManager>`. All operations on the underlying queue are
/// serialised by its internal mutex.
///
/// # Example
///
/// ```rust,no_run
/// use fanout::queue::{Message, QueueManager};
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = Arc::new(QueueManager::new());
///
/// let publisher = manager.create_publisher("my-service".to_string())?;
/// let consumer = manager.create_consumer("my-worker".to_string())?;
///
/// publisher.publish(Message::new(
///     "my-service".to_string(),
///     "event".to_string(),
///     "payload".to_string(),
/// ))?;
///
/// let message = consumer.recv()?;
/// println!("received: {}", message.data);
///
/// manager.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct QueueManager {
    next_subscriber_id: AtomicU64,
    /// Single broadcast queue shared by all publishers and consumers
    queue: Arc<BroadcastQueue<Message>>,
}

impl QueueManager {
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            next_subscriber_id: AtomicU64::new(0),
            queue: Arc::new(BroadcastQueue::with_config(config)),
        }
    }

    /// Create a publisher handle for a specific producer_id
    pub fn create_publisher(self: &Arc<Self>, producer_id: String) -> QueueResult<QueuePublisher> {
        Ok(QueuePublisher::new(producer_id, Arc::downgrade(self)))
    }

    /// Create a consumer handle, registering it with the queue
    ///
    /// Fails with `RegistryFull` when the subscriber registry is at its
    /// bound. The consumer deregisters itself when dropped.
    pub fn create_consumer(self: &Arc<Self>, consumer_name: String) -> QueueResult<QueueConsumer> {
        let subscriber_id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        QueueConsumer::new(
            format!("consumer-{}", subscriber_id),
            consumer_name,
            Arc::downgrade(self),
            subscriber_id,
        )
    }

    /// Get the underlying broadcast queue
    pub fn queue(&self) -> Arc<BroadcastQueue<Message>> {
        Arc::clone(&self.queue)
    }

    /// Total number of live messages in the queue
    pub fn message_count(&self) -> usize {
        self.queue.len()
    }

    /// Current queue capacity
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Number of registered consumers
    pub fn active_consumer_count(&self) -> usize {
        self.queue.subscriber_count()
    }

    /// Point-in-time queue counters
    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Backlog statistics across all registered consumers
    pub fn lag_stats(&self) -> LagStats {
        self.queue.lag_stats()
    }

    /// Backlog of a specific consumer (messages behind the tail)
    pub fn consumer_lag(&self, consumer: &QueueConsumer) -> usize {
        self.queue.available(consumer.subscriber_id())
    }

    /// Cancel a specific unconsumed message by identity
    ///
    /// Returns false when the message is no longer in the queue, which
    /// is expected when it raced with consumption.
    pub fn cancel(&self, message: &Arc<Message>) -> bool {
        self.queue.remove(message)
    }

    /// Change the queue capacity; see [`BroadcastQueue::resize`]
    pub fn resize(&self, new_capacity: usize) -> bool {
        self.queue.resize(new_capacity)
    }

    /// Shut the queue down, unblocking and evicting every parked
    /// publisher and consumer before the backlog is discarded
    ///
    /// Blocks until the drain completes. Handles remain valid but every
    /// subsequent publish/consume returns `Closed`.
    pub fn shutdown(&self) {
        log::debug!("queue manager shutting down");
        self.queue.close();
    }
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}
