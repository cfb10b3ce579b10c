//! Queue Consumer for receiving broadcast messages
//!
//! Consumers read from the shared broadcast queue, each holding its own
//! registry slot and read cursor. Every consumer receives every message
//! published while it is registered, in publish order, at its own pace.

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::manager::QueueManager;
use crate::queue::message::Message;
use std::sync::{Arc, Weak};

/// Consumer handle for reading messages from the queue
///
/// Each QueueConsumer occupies one registry slot with an independent
/// cursor, so it reads the stream at its own pace without affecting
/// other consumers. The consumer registers with the queue on creation
/// and deregisters on drop, releasing its claim on any unread backlog.
///
/// # Example
///
/// ```rust,no_run
/// # use fanout::queue::QueueManager;
/// # use std::sync::Arc;
/// # fn example(manager: Arc<QueueManager>) -> Result<(), Box<dyn std::error::Error>> {
/// let consumer = manager.create_consumer("my-worker".to_string())?;
///
/// // Blocking read: parks until a message arrives or the queue closes
/// let message = consumer.recv()?;
/// println!("processing: {}", message.data);
///
/// // Non-blocking read
/// while let Some(message) = consumer.try_recv()? {
///     println!("draining: {}", message.data);
/// }
/// # Ok(())
/// # }
/// ```
pub struct QueueConsumer {
    consumer_id: String,
    consumer_name: String,
    manager: Weak<QueueManager>,
    subscriber_id: u64,
}

impl QueueConsumer {
    pub(crate) fn new(
        consumer_id: String,
        consumer_name: String,
        manager: Weak<QueueManager>,
        subscriber_id: u64,
    ) -> QueueResult<Self> {
        let consumer = Self {
            consumer_id,
            consumer_name,
            manager: manager.clone(),
            subscriber_id,
        };

        // Register with the queue; manager-allocated ids are unique
        if let Some(mgr) = manager.upgrade() {
            mgr.queue().subscribe(subscriber_id)?;
        }

        Ok(consumer)
    }

    pub fn consumer_id(&self) -> &str {
        &self.consumer_id
    }

    pub fn consumer_name(&self) -> &str {
        &self.consumer_name
    }

    /// Registry identity used for cursor tracking
    pub fn subscriber_id(&self) -> u64 {
        self.subscriber_id
    }

    fn manager(&self) -> QueueResult<Arc<QueueManager>> {
        self.manager
            .upgrade()
            .ok_or_else(|| QueueError::OperationFailed {
                message: "QueueManager no longer exists".to_string(),
            })
    }

    /// Receive the next message, blocking while none is available
    ///
    /// Returns `Closed` if the queue shuts down before or during the
    /// wait, and `NotSubscribed` if this consumer was deregistered
    /// concurrently.
    pub fn recv(&self) -> QueueResult<Arc<Message>> {
        self.manager()?.queue().consume(self.subscriber_id)
    }

    /// Receive the next message without blocking
    ///
    /// Returns `Ok(None)` when this consumer has read everything
    /// currently in the queue.
    pub fn try_recv(&self) -> QueueResult<Option<Arc<Message>>> {
        self.manager()?.queue().try_consume(self.subscriber_id)
    }

    /// Receive up to `batch_size` already-available messages
    ///
    /// Does not block: returns fewer messages (possibly none) when the
    /// backlog runs out.
    pub fn recv_batch(&self, batch_size: usize) -> QueueResult<Vec<Arc<Message>>> {
        let mut batch = Vec::with_capacity(batch_size);

        for _ in 0..batch_size {
            match self.try_recv()? {
                Some(message) => batch.push(message),
                None => break,
            }
        }

        Ok(batch)
    }

    /// Number of unread messages waiting for this consumer
    pub fn available(&self) -> usize {
        match self.manager.upgrade() {
            Some(manager) => manager.queue().available(self.subscriber_id),
            None => 0,
        }
    }
}

impl Drop for QueueConsumer {
    fn drop(&mut self) {
        // Deregister so unread messages stop counting this consumer
        if let Some(manager) = self.manager.upgrade() {
            manager.queue().unsubscribe(self.subscriber_id);
        }
    }
}
