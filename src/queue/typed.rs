//! Typed queue consumers for type-safe message handling
//!
//! This module provides typed wrappers around the generic queue system,
//! allowing components to work directly with strongly-typed messages
//! instead of manually deserializing from generic Message wrappers.

use crate::queue::consumer::QueueConsumer;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::manager::QueueManager;
use crate::queue::message::{Message, MessageHeader};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed queue consumer that automatically deserializes messages to a
/// specific type
///
/// This wrapper eliminates manual deserialization and provides
/// compile-time type safety for message handling. Message data is
/// expected to be JSON produced by the publishing side.
///
/// # Type Parameters
/// * `T` - The message type to deserialize to (must implement
///   `DeserializeOwned`)
pub struct TypedQueueConsumer<T> {
    inner: QueueConsumer,
    _phantom: PhantomData<T>,
}

impl<T> TypedQueueConsumer<T>
where
    T: DeserializeOwned,
{
    /// Create a new typed consumer wrapping a base consumer
    pub fn new(inner: QueueConsumer) -> Self {
        Self {
            inner,
            _phantom: PhantomData,
        }
    }

    /// Receive a strongly-typed message, blocking while none is available
    pub fn recv(&self) -> QueueResult<T> {
        let message = self.inner.recv()?;
        self.deserialize_message(&message)
    }

    /// Receive a strongly-typed message without blocking
    ///
    /// Returns:
    /// - `Ok(Some(T))` - Successfully read and deserialized a message
    /// - `Ok(None)` - No messages available in the queue
    /// - `Err(QueueError)` - Queue error or deserialization failure
    pub fn try_recv(&self) -> QueueResult<Option<T>> {
        match self.inner.try_recv()? {
            Some(message) => {
                let typed_message = self.deserialize_message(&message)?;
                Ok(Some(typed_message))
            }
            None => Ok(None),
        }
    }

    /// Receive the underlying message header along with typed content
    ///
    /// This provides access to metadata like producer ID and timestamp
    /// while still getting the strongly-typed message content.
    pub fn try_recv_with_header(&self) -> QueueResult<Option<TypedMessage<T>>> {
        match self.inner.try_recv()? {
            Some(message) => {
                let typed_content = self.deserialize_message(&message)?;
                Ok(Some(TypedMessage {
                    header: message.header.clone(),
                    content: typed_content,
                }))
            }
            None => Ok(None),
        }
    }

    /// Deserialize an Arc<Message> to the target type
    fn deserialize_message(&self, message: &Arc<Message>) -> QueueResult<T> {
        serde_json::from_str(&message.data).map_err(|e| {
            let data_preview = if message.data.len() > 100 {
                let truncated_bytes = &message.data.as_bytes()[..100];
                format!("{}...", String::from_utf8_lossy(truncated_bytes))
            } else {
                message.data.clone()
            };

            QueueError::DeserializationError {
                message: format!(
                    "Failed to deserialize message to {}: {} | type: '{}', producer: '{}' | data_length: {}, data_preview: '{}'",
                    std::any::type_name::<T>(),
                    e,
                    message.header.message_type,
                    message.header.producer_id,
                    message.data.len(),
                    data_preview
                ),
            }
        })
    }

    /// Get access to the underlying consumer for advanced operations
    pub fn inner(&self) -> &QueueConsumer {
        &self.inner
    }
}

/// A typed message containing both header metadata and strongly-typed
/// content
#[derive(Debug, Clone)]
pub struct TypedMessage<T> {
    /// Message header with metadata (producer, timestamp, type)
    pub header: MessageHeader,
    /// Strongly-typed message content
    pub content: T,
}

impl<T> TypedMessage<T> {
    /// Get the producer ID that sent this message
    pub fn producer_id(&self) -> &str {
        &self.header.producer_id
    }

    /// Get the message type string
    pub fn message_type(&self) -> &str {
        &self.header.message_type
    }

    /// Get the timestamp when the message was created
    pub fn timestamp(&self) -> std::time::SystemTime {
        self.header.timestamp
    }
}

/// Extension trait for QueueManager to create typed consumers
pub trait TypedQueueManagerExt {
    /// Create a typed consumer for a specific message type
    ///
    /// # Type Parameters
    /// * `T` - The message type to deserialize to
    ///
    /// # Arguments
    /// * `consumer_name` - Identifier for this consumer
    fn create_typed_consumer<T>(&self, consumer_name: String) -> QueueResult<TypedQueueConsumer<T>>
    where
        T: DeserializeOwned;
}

impl TypedQueueManagerExt for Arc<QueueManager> {
    fn create_typed_consumer<T>(&self, consumer_name: String) -> QueueResult<TypedQueueConsumer<T>>
    where
        T: DeserializeOwned,
    {
        let base_consumer = self.create_consumer(consumer_name)?;
        Ok(TypedQueueConsumer::new(base_consumer))
    }
}

// Tests are located in src/queue/tests/typed.rs
