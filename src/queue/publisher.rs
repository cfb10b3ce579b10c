//! Queue Publisher for sending messages
//!
//! Publishers send messages to the shared broadcast queue where they
//! become available to all registered consumers. Each publisher is
//! identified by a producer_id that is included in message headers.

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::manager::QueueManager;
use crate::queue::message::Message;
use crate::queue::types::PublishOutcome;
use std::sync::{Arc, Weak};

/// Publisher handle for sending messages to the queue
///
/// The QueuePublisher provides a lightweight handle for publishing
/// messages. The queue assigns monotonic sequence numbers at insertion,
/// reported back through [`PublishOutcome`].
///
/// # Backpressure
///
/// `publish` blocks while the queue is at capacity and there are
/// subscribers to drain it; it returns `Closed` if the queue shuts
/// down while the call is waiting for space.
///
/// # Example
///
/// ```rust,no_run
/// use fanout::queue::{Message, QueueManager};
/// use std::sync::Arc;
///
/// # fn example(manager: Arc<QueueManager>) -> Result<(), Box<dyn std::error::Error>> {
/// let publisher = manager.create_publisher("my-service".to_string())?;
///
/// let outcome = publisher.publish(Message::new(
///     "my-service".to_string(),
///     "user_action".to_string(),
///     "User clicked button".to_string(),
/// ))?;
///
/// if let Some(sequence) = outcome.sequence() {
///     println!("published message with sequence: {}", sequence);
/// }
/// # Ok(())
/// # }
/// ```
pub struct QueuePublisher {
    producer_id: String,
    manager: Weak<QueueManager>,
}

impl QueuePublisher {
    pub(crate) fn new(producer_id: String, manager: Weak<QueueManager>) -> Self {
        Self {
            producer_id,
            manager,
        }
    }

    pub fn producer_id(&self) -> &str {
        &self.producer_id
    }

    /// Publish a message to the queue, blocking while it is full
    pub fn publish(&self, message: Message) -> QueueResult<PublishOutcome> {
        self.publish_shared(Arc::new(message))
    }

    /// Publish an already-shared message
    ///
    /// Use this form when the message may need to be cancelled later:
    /// [`QueueManager::cancel`] matches by `Arc` identity, so the caller
    /// must keep a clone of the `Arc` it published.
    pub fn publish_shared(&self, message: Arc<Message>) -> QueueResult<PublishOutcome> {
        let manager = self
            .manager
            .upgrade()
            .ok_or_else(|| QueueError::OperationFailed {
                message: "QueueManager no longer exists".to_string(),
            })?;

        manager.queue().publish(message)
    }
}
