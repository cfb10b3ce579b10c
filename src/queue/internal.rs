//! Internal BroadcastQueue implementation with sequence-based ordering
//!
//! This module provides the core queue functionality with:
//! - Sequence-based message ordering, with the sequence number acting as
//!   the stable handle subscriber cursors refer to
//! - Arc-wrapped payloads for zero-copy sharing between subscribers
//! - Per-message receiver counting: a message is unlinked exactly when
//!   the last subscriber that still needed it has consumed it, dropped
//!   out, or cancelled it
//! - Backpressure: publishers block while the chain is at capacity
//! - Blocking reads: subscribers block while fully caught up
//! - Two-phase drain on close so no caller is left parked on a
//!   condition variable when the queue is torn down

use crate::queue::error::{QueueError, QueueResult};
use crate::queue::types::{LagStats, Lifecycle, PublishOutcome, QueueConfig, QueueStats};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex};

/// Internal chain entry with sequence number and Arc-wrapped payload
struct QueueEntry<T> {
    sequence: u64,
    /// Subscribers that still need to read this message; fixed at
    /// publish time to the subscriber count at that instant
    receivers: usize,
    payload: Arc<T>,
}

/// Registry slot for one subscriber
struct Subscription {
    /// Sequence of the next unread message, or `None` when caught up.
    /// If set, it always names an entry currently in the chain.
    next_unread: Option<u64>,
}

/// All mutable queue state, guarded by a single mutex
struct QueueState<T> {
    /// Ordered message chain, oldest at the front
    chain: VecDeque<QueueEntry<T>>,
    /// Monotonic sequence counter for message ordering
    next_sequence: u64,
    /// Upper bound on live messages; publishers block at this depth
    capacity: usize,
    /// Subscriber registry keyed by caller-supplied identity
    subscribers: HashMap<u64, Subscription>,
    lifecycle: Lifecycle,
    /// Callers currently inside publish, counted for the close drain
    active_publishers: usize,
    /// Callers currently inside a blocking consume, same purpose
    active_subscribers: usize,
}

impl<T> QueueState<T> {
    /// Chain index of the entry carrying `sequence`.
    ///
    /// The chain is ordered by sequence, and a set cursor always names a
    /// live entry, so the lookup cannot miss for cursor-derived input.
    fn entry_index(&self, sequence: u64) -> usize {
        self.chain
            .binary_search_by_key(&sequence, |entry| entry.sequence)
            .expect("cursor names a live chain entry")
    }

    /// Unlink the entry at `idx`, repointing every cursor that referenced
    /// it to its successor (or to none if it was the tail).
    ///
    /// Handles the sole/head/tail/interior cases uniformly: after the
    /// removal the successor, if any, sits at the same index.
    fn unlink(&mut self, idx: usize) {
        let entry = self.chain.remove(idx).expect("unlink index in bounds");
        let successor = self.chain.get(idx).map(|next| next.sequence);
        for subscription in self.subscribers.values_mut() {
            if subscription.next_unread == Some(entry.sequence) {
                subscription.next_unread = successor;
            }
        }
        log::trace!(
            "message {} unlinked from chain ({} live)",
            entry.sequence,
            self.chain.len()
        );
    }

    /// Read the entry a subscriber's cursor points at, advance the
    /// cursor, and unlink the entry if this was its last pending read.
    fn take_at_cursor(&mut self, identity: u64, sequence: u64) -> Arc<T> {
        let idx = self.entry_index(sequence);
        let successor = self.chain.get(idx + 1).map(|next| next.sequence);
        let payload = Arc::clone(&self.chain[idx].payload);

        self.chain[idx].receivers -= 1;
        let fully_read = self.chain[idx].receivers == 0;

        if let Some(subscription) = self.subscribers.get_mut(&identity) {
            subscription.next_unread = successor;
        }

        if fully_read {
            // No other cursor can reference this entry: a cursor at it
            // would have kept its receiver count above zero.
            self.unlink(idx);
        }
        payload
    }

    /// Unread message count from a subscriber's cursor to the tail
    fn backlog(&self, subscription: &Subscription) -> usize {
        match subscription.next_unread {
            Some(sequence) => self.chain.len() - self.entry_index(sequence),
            None => 0,
        }
    }
}

/// Bounded broadcast queue delivering every message to every subscriber
/// registered at publish time, in publish order, exactly once each.
///
/// All shared state lives behind one mutex; the two condition variables
/// model the two distinct wait reasons (space for publishers, new data
/// for subscribers). Every blocking operation is a wait-while-predicate
/// loop that re-checks shutdown, and for consume continued registration,
/// on each wakeup.
///
/// The queue is fully thread-safe; share it across threads with
/// `Arc<BroadcastQueue<T>>`.
pub struct BroadcastQueue<T> {
    state: Mutex<QueueState<T>>,
    /// Signalled whenever chain space may have been freed
    space_available: Condvar,
    /// Signalled whenever a new message may be readable
    message_available: Condvar,
    /// Registry bound; subscribing beyond it fails with `RegistryFull`
    max_subscribers: usize,
}

impl<T> BroadcastQueue<T> {
    /// Create a queue bounded to `capacity` live messages, with the
    /// default subscriber registry bound.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(QueueConfig {
            capacity,
            ..QueueConfig::default()
        })
    }

    /// Create a queue from an explicit configuration.
    ///
    /// # Panics
    ///
    /// Panics if `config.capacity` is zero.
    pub fn with_config(config: QueueConfig) -> Self {
        assert!(config.capacity >= 1, "queue capacity must be at least 1");
        Self {
            state: Mutex::new(QueueState {
                chain: VecDeque::new(),
                next_sequence: 1,
                capacity: config.capacity,
                subscribers: HashMap::new(),
                lifecycle: Lifecycle::Running,
                active_publishers: 0,
                active_subscribers: 0,
            }),
            space_available: Condvar::new(),
            message_available: Condvar::new(),
            max_subscribers: config.max_subscribers,
        }
    }

    /// Register a subscriber under a caller-supplied identity.
    ///
    /// A new subscriber sees no backlog: only messages published after
    /// registration are delivered to it. Identities must be unique among
    /// currently registered subscribers.
    pub fn subscribe(&self, identity: u64) -> QueueResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.lifecycle.is_shutting_down() {
            return Err(QueueError::Closed);
        }
        if state.subscribers.contains_key(&identity) {
            return Err(QueueError::AlreadySubscribed { identity });
        }
        if state.subscribers.len() >= self.max_subscribers {
            log::warn!(
                "subscribe {} rejected; registry full at {}",
                identity,
                self.max_subscribers
            );
            return Err(QueueError::RegistryFull {
                capacity: self.max_subscribers,
            });
        }
        state
            .subscribers
            .insert(identity, Subscription { next_unread: None });
        log::debug!(
            "subscriber {} registered ({} total)",
            identity,
            state.subscribers.len()
        );
        drop(state);
        self.space_available.notify_all();
        Ok(())
    }

    /// Deregister a subscriber.
    ///
    /// Messages the subscriber had not read lose one pending receiver;
    /// any message left with none is unlinked immediately. Unknown
    /// identities are ignored. Returns whether a registration was
    /// actually removed.
    pub fn unsubscribe(&self, identity: u64) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(subscription) = state.subscribers.remove(&identity) else {
            log::trace!("unsubscribe for unknown identity {}; ignoring", identity);
            return false;
        };

        if let Some(sequence) = subscription.next_unread {
            // This subscriber will never read anything from its cursor
            // through the tail; drop its claim on each of those entries.
            let mut idx = state.entry_index(sequence);
            while idx < state.chain.len() {
                state.chain[idx].receivers -= 1;
                if state.chain[idx].receivers == 0 {
                    state.unlink(idx);
                } else {
                    idx += 1;
                }
            }
        }

        log::debug!(
            "subscriber {} deregistered ({} remain)",
            identity,
            state.subscribers.len()
        );
        drop(state);
        self.space_available.notify_all();
        true
    }

    /// Publish a payload to every currently registered subscriber.
    ///
    /// Blocks while the chain is at capacity. With no subscribers
    /// registered the payload is discarded, not buffered; the returned
    /// outcome reports which of the two happened. Returns `Closed` if
    /// the queue is shutting down, including when shutdown begins while
    /// this call is parked waiting for space.
    ///
    /// Callers that may later cancel the message should retain a clone
    /// of the `Arc` they pass in; `remove` matches by `Arc` identity.
    pub fn publish(&self, payload: Arc<T>) -> QueueResult<PublishOutcome> {
        let mut state = self.state.lock().unwrap();
        if state.lifecycle.is_shutting_down() {
            return Err(QueueError::Closed);
        }

        state.active_publishers += 1;
        while state.chain.len() >= state.capacity {
            log::trace!("chain full at {}; publisher waiting", state.capacity);
            state = self.space_available.wait(state).unwrap();
            if state.lifecycle.is_shutting_down() {
                state.active_publishers -= 1;
                drop(state);
                // Keeps the drain moving: the closer parks on this same
                // condition until every publisher has left.
                self.space_available.notify_all();
                return Err(QueueError::Closed);
            }
        }

        if state.subscribers.is_empty() {
            state.active_publishers -= 1;
            log::trace!("no subscribers registered; message discarded");
            drop(state);
            self.message_available.notify_all();
            return Ok(PublishOutcome::NoSubscribers);
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        let receivers = state.subscribers.len();
        state.chain.push_back(QueueEntry {
            sequence,
            receivers,
            payload,
        });

        // Caught-up subscribers point at the new tail; anyone with an
        // unread backlog reaches it by walking the chain instead.
        for subscription in state.subscribers.values_mut() {
            if subscription.next_unread.is_none() {
                subscription.next_unread = Some(sequence);
            }
        }

        log::trace!("message {} published to {} subscribers", sequence, receivers);
        state.active_publishers -= 1;
        drop(state);
        self.message_available.notify_all();
        Ok(PublishOutcome::Delivered(sequence))
    }

    /// Consume the next unread message for `identity`, blocking while
    /// the subscriber is fully caught up.
    ///
    /// Returns `NotSubscribed` if the identity is not registered,
    /// including when it is unsubscribed by another thread while this
    /// call is parked. Returns `Closed` if the queue shuts down before
    /// or during the wait.
    pub fn consume(&self, identity: u64) -> QueueResult<Arc<T>> {
        let mut state = self.state.lock().unwrap();
        if state.lifecycle.is_shutting_down() {
            return Err(QueueError::Closed);
        }

        state.active_subscribers += 1;
        let sequence = loop {
            let cursor = match state.subscribers.get(&identity) {
                Some(subscription) => subscription.next_unread,
                None => {
                    state.active_subscribers -= 1;
                    return Err(QueueError::NotSubscribed { identity });
                }
            };
            if let Some(sequence) = cursor {
                break sequence;
            }
            log::trace!("subscriber {} caught up; waiting for messages", identity);
            state = self.message_available.wait(state).unwrap();
            if state.lifecycle.is_shutting_down() {
                state.active_subscribers -= 1;
                drop(state);
                self.message_available.notify_all();
                return Err(QueueError::Closed);
            }
        };

        let payload = state.take_at_cursor(identity, sequence);
        state.active_subscribers -= 1;
        drop(state);
        self.space_available.notify_all();
        Ok(payload)
    }

    /// Non-blocking variant of [`consume`](Self::consume): returns
    /// `Ok(None)` when the subscriber is fully caught up.
    pub fn try_consume(&self, identity: u64) -> QueueResult<Option<Arc<T>>> {
        let mut state = self.state.lock().unwrap();
        if state.lifecycle.is_shutting_down() {
            return Err(QueueError::Closed);
        }
        let cursor = match state.subscribers.get(&identity) {
            Some(subscription) => subscription.next_unread,
            None => return Err(QueueError::NotSubscribed { identity }),
        };
        match cursor {
            None => Ok(None),
            Some(sequence) => {
                let payload = state.take_at_cursor(identity, sequence);
                drop(state);
                self.space_available.notify_all();
                Ok(Some(payload))
            }
        }
    }

    /// Number of unread messages for `identity` (0 if not subscribed)
    pub fn available(&self, identity: u64) -> usize {
        let state = self.state.lock().unwrap();
        match state.subscribers.get(&identity) {
            Some(subscription) => state.backlog(subscription),
            None => 0,
        }
    }

    /// Cancel a specific unconsumed message.
    ///
    /// Matches by `Arc` identity against the payload passed to
    /// `publish`. The first matching live message is unlinked, with
    /// every cursor that pointed at it moved to its successor. Returns
    /// false if no live message matches, which is an expected race
    /// outcome (e.g. it was concurrently consumed), not an error.
    pub fn remove(&self, payload: &Arc<T>) -> bool {
        let mut state = self.state.lock().unwrap();
        let found = state
            .chain
            .iter()
            .position(|entry| Arc::ptr_eq(&entry.payload, payload));
        let Some(idx) = found else {
            log::trace!("remove: message not found in chain; ignoring");
            return false;
        };
        state.unlink(idx);
        drop(state);
        self.space_available.notify_all();
        true
    }

    /// Change the chain capacity.
    ///
    /// Growing, or shrinking to a bound the current depth already fits,
    /// only updates the limit. Shrinking below the current depth evicts
    /// the oldest messages unconditionally until the new bound holds,
    /// truncating unread backlog; cursors into the evicted prefix end up
    /// on the oldest surviving message. Values below 1 are rejected.
    pub fn resize(&self, new_capacity: usize) -> bool {
        if new_capacity < 1 {
            log::warn!("resize to {} rejected; capacity must be >= 1", new_capacity);
            return false;
        }
        let mut state = self.state.lock().unwrap();
        if state.lifecycle.is_shutting_down() {
            return false;
        }
        let evicted = state.chain.len().saturating_sub(new_capacity);
        while state.chain.len() > new_capacity {
            state.unlink(0);
        }
        state.capacity = new_capacity;
        if evicted > 0 {
            log::debug!(
                "capacity shrunk to {}; {} oldest messages evicted",
                new_capacity,
                evicted
            );
        }
        drop(state);
        self.space_available.notify_all();
        true
    }

    /// Close the queue, draining every parked caller before teardown.
    ///
    /// Two-phase drain: first every publisher parked on the space
    /// condition is woken and exits with `Closed`, then the same for
    /// subscribers parked on the message condition. Only once both
    /// active counts reach zero are the remaining messages and the
    /// registry dropped. In-flight calls that already hold the mutex
    /// finish their critical section normally; no new publish/consume
    /// is admitted once closing has begun.
    ///
    /// Idempotent: repeated or concurrent calls after the drain has
    /// started return immediately.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        if state.lifecycle.is_shutting_down() {
            return;
        }

        log::debug!("queue closing; draining parked publishers");
        state.lifecycle = Lifecycle::DrainingPublishers;
        while state.active_publishers > 0 {
            self.space_available.notify_all();
            state = self.space_available.wait(state).unwrap();
        }

        log::debug!("publishers drained; draining parked subscribers");
        state.lifecycle = Lifecycle::DrainingSubscribers;
        while state.active_subscribers > 0 {
            self.message_available.notify_all();
            state = self.message_available.wait(state).unwrap();
        }

        let discarded = state.chain.len();
        state.chain.clear();
        state.subscribers.clear();
        state.lifecycle = Lifecycle::Closed;
        log::debug!("queue closed; {} undelivered messages discarded", discarded);
    }

    /// Current number of live messages in the chain
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current chain capacity
    pub fn capacity(&self) -> usize {
        self.state.lock().unwrap().capacity
    }

    /// Registry bound this queue was created with
    pub fn max_subscribers(&self) -> usize {
        self.max_subscribers
    }

    /// Number of currently registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().unwrap().subscribers.len()
    }

    /// Identities of all currently registered subscribers
    pub fn subscriber_ids(&self) -> Vec<u64> {
        self.state.lock().unwrap().subscribers.keys().copied().collect()
    }

    /// Current lifecycle phase
    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lock().unwrap().lifecycle
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle().is_shutting_down()
    }

    /// Point-in-time counters, taken under one lock acquisition
    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock().unwrap();
        QueueStats {
            depth: state.chain.len(),
            capacity: state.capacity,
            subscribers: state.subscribers.len(),
            next_sequence: state.next_sequence,
        }
    }

    /// Backlog statistics across all registered subscribers
    pub fn lag_stats(&self) -> LagStats {
        let state = self.state.lock().unwrap();
        if state.subscribers.is_empty() {
            return LagStats {
                total_subscribers: 0,
                max_lag: 0,
                min_lag: 0,
                avg_lag: 0.0,
            };
        }

        let lags: Vec<usize> = state
            .subscribers
            .values()
            .map(|subscription| state.backlog(subscription))
            .collect();

        LagStats {
            total_subscribers: lags.len(),
            max_lag: *lags.iter().max().unwrap(),
            min_lag: *lags.iter().min().unwrap(),
            avg_lag: lags.iter().sum::<usize>() as f64 / lags.len() as f64,
        }
    }
}
