//! Type definitions for the queue system
//!
//! This module contains the core data structures used throughout
//! the queue system for configuration, lifecycle tracking and
//! subscriber statistics.

/// Configuration for a broadcast queue
///
/// `capacity` bounds the number of live messages; publishers block once
/// it is reached. `max_subscribers` bounds the subscriber registry;
/// subscribing beyond it fails with `RegistryFull`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Maximum number of live messages held at once (must be >= 1)
    pub capacity: usize,
    /// Maximum number of concurrently registered subscribers
    pub max_subscribers: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            max_subscribers: 50,
        }
    }
}

/// Outcome of a successful publish call
///
/// Publishing to a queue with no registered subscribers is not an error:
/// the message has no possible recipient and is discarded rather than
/// buffered, which the outcome reports explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Message was appended to the chain with the given sequence number
    Delivered(u64),
    /// No subscribers were registered; the message was discarded
    NoSubscribers,
}

impl PublishOutcome {
    /// Sequence number assigned to the message, if it was delivered
    pub fn sequence(&self) -> Option<u64> {
        match self {
            PublishOutcome::Delivered(sequence) => Some(*sequence),
            PublishOutcome::NoSubscribers => None,
        }
    }
}

/// Lifecycle phase of a queue
///
/// Teardown is a one-way walk through this state machine: once past
/// `Running` no new publish/consume call is admitted, and the queue is
/// freed for reuse only after both drain phases have emptied out every
/// parked caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Normal operation
    Running,
    /// Close requested; waiting for parked publishers to exit
    DrainingPublishers,
    /// Parked publishers gone; waiting for parked subscribers to exit
    DrainingSubscribers,
    /// Drained and emptied; all operations return `Closed` or no-op
    Closed,
}

impl Lifecycle {
    /// True once teardown has started (any phase past `Running`)
    pub fn is_shutting_down(&self) -> bool {
        !matches!(self, Lifecycle::Running)
    }
}

/// Point-in-time counters for a queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStats {
    /// Number of live messages in the chain
    pub depth: usize,
    /// Current chain capacity
    pub capacity: usize,
    /// Number of registered subscribers
    pub subscribers: usize,
    /// Next sequence number to be assigned
    pub next_sequence: u64,
}

/// Subscriber backlog statistics for the queue system
#[derive(Debug, Clone, PartialEq)]
pub struct LagStats {
    /// Total number of registered subscribers
    pub total_subscribers: usize,
    /// Maximum backlog among all subscribers
    pub max_lag: usize,
    /// Minimum backlog among all subscribers
    pub min_lag: usize,
    /// Average backlog across all subscribers
    pub avg_lag: f64,
}
