//! Queue Error Types

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Subscriber registry is full (capacity: {capacity})")]
    RegistryFull { capacity: usize },

    #[error("Identity is already subscribed: {identity}")]
    AlreadySubscribed { identity: u64 },

    #[error("Identity is not subscribed: {identity}")]
    NotSubscribed { identity: u64 },

    #[error("Queue is closed")]
    Closed,

    #[error("Deserialization failed: {message}")]
    DeserializationError { message: String },

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
