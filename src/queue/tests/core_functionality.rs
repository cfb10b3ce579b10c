//! Core functionality tests for the broadcast queue
//!
//! These tests cover the fundamental delivery contract through the
//! facade: broadcast to all registered consumers, publish-order
//! delivery, exactly-once consumption and cursor independence.

#[cfg(test)]
mod tests {
    use crate::queue::api::{Message, QueueManager};
    use std::sync::Arc;

    fn test_message(producer: &str, data: &str) -> Message {
        Message::new(producer.to_string(), "test".to_string(), data.to_string())
    }

    #[test]
    fn test_single_consumer_receives_in_publish_order() {
        let manager = Arc::new(QueueManager::new());
        let publisher = manager.create_publisher("producer".to_string()).unwrap();
        let consumer = manager.create_consumer("worker".to_string()).unwrap();

        for i in 0..5 {
            publisher
                .publish(test_message("producer", &format!("msg-{}", i)))
                .unwrap();
        }

        for i in 0..5 {
            let message = consumer.try_recv().unwrap().unwrap();
            assert_eq!(message.data, format!("msg-{}", i));
        }
        assert!(consumer.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_every_consumer_receives_every_message() {
        let manager = Arc::new(QueueManager::new());
        let publisher = manager.create_publisher("producer".to_string()).unwrap();

        let consumer_a = manager.create_consumer("worker-a".to_string()).unwrap();
        let consumer_b = manager.create_consumer("worker-b".to_string()).unwrap();
        let consumer_c = manager.create_consumer("worker-c".to_string()).unwrap();

        publisher.publish(test_message("producer", "one")).unwrap();
        publisher.publish(test_message("producer", "two")).unwrap();

        for consumer in [&consumer_a, &consumer_b, &consumer_c] {
            assert_eq!(consumer.try_recv().unwrap().unwrap().data, "one");
            assert_eq!(consumer.try_recv().unwrap().unwrap().data, "two");
            assert!(consumer.try_recv().unwrap().is_none());
        }
    }

    #[test]
    fn test_independent_consumer_pace() {
        let manager = Arc::new(QueueManager::new());
        let publisher = manager.create_publisher("producer".to_string()).unwrap();

        let fast = manager.create_consumer("fast".to_string()).unwrap();
        let slow = manager.create_consumer("slow".to_string()).unwrap();

        publisher.publish(test_message("producer", "m1")).unwrap();
        publisher.publish(test_message("producer", "m2")).unwrap();

        // Fast consumer drains everything
        assert_eq!(fast.try_recv().unwrap().unwrap().data, "m1");
        assert_eq!(fast.try_recv().unwrap().unwrap().data, "m2");
        assert!(fast.try_recv().unwrap().is_none());

        // Messages stay live until the slow consumer catches up
        assert_eq!(manager.message_count(), 2);
        assert_eq!(slow.available(), 2);

        assert_eq!(slow.try_recv().unwrap().unwrap().data, "m1");
        assert_eq!(slow.try_recv().unwrap().unwrap().data, "m2");
        assert_eq!(manager.message_count(), 0, "fully-read messages must be freed");
    }

    #[test]
    fn test_consumer_only_sees_messages_published_after_subscribing() {
        let manager = Arc::new(QueueManager::new());
        let publisher = manager.create_publisher("producer".to_string()).unwrap();
        let early = manager.create_consumer("early".to_string()).unwrap();

        publisher.publish(test_message("producer", "before")).unwrap();

        let late = manager.create_consumer("late".to_string()).unwrap();
        publisher.publish(test_message("producer", "after")).unwrap();

        assert_eq!(early.available(), 2);
        assert_eq!(late.available(), 1, "no backlog for a new consumer");
        assert_eq!(late.try_recv().unwrap().unwrap().data, "after");

        assert_eq!(early.try_recv().unwrap().unwrap().data, "before");
        assert_eq!(early.try_recv().unwrap().unwrap().data, "after");
    }

    #[test]
    fn test_publish_without_consumers_is_discarded() {
        let manager = Arc::new(QueueManager::new());
        let publisher = manager.create_publisher("producer".to_string()).unwrap();

        let outcome = publisher.publish(test_message("producer", "orphan")).unwrap();

        assert_eq!(outcome.sequence(), None);
        assert_eq!(manager.message_count(), 0, "discarded publish must not queue");
    }

    #[test]
    fn test_delivered_sequences_are_monotonic() {
        let manager = Arc::new(QueueManager::new());
        let publisher = manager.create_publisher("producer".to_string()).unwrap();
        let _consumer = manager.create_consumer("worker".to_string()).unwrap();

        let mut last = 0;
        for i in 0..10 {
            let outcome = publisher
                .publish(test_message("producer", &format!("m{}", i)))
                .unwrap();
            let sequence = outcome.sequence().expect("delivered with a consumer present");
            assert!(sequence > last, "sequences must increase");
            last = sequence;
        }
    }

    #[test]
    fn test_lag_statistics() {
        let manager = Arc::new(QueueManager::new());
        let publisher = manager.create_publisher("producer".to_string()).unwrap();

        let ahead = manager.create_consumer("ahead".to_string()).unwrap();
        let behind = manager.create_consumer("behind".to_string()).unwrap();

        for i in 0..4 {
            publisher
                .publish(test_message("producer", &format!("m{}", i)))
                .unwrap();
        }
        let _ = ahead.recv_batch(3).unwrap();

        let stats = manager.lag_stats();
        assert_eq!(stats.total_subscribers, 2);
        assert_eq!(stats.max_lag, 4);
        assert_eq!(stats.min_lag, 1);
        assert_eq!(stats.avg_lag, 2.5);

        assert_eq!(manager.consumer_lag(&ahead), 1);
        assert_eq!(manager.consumer_lag(&behind), 4);
    }

    #[test]
    fn test_manager_resize_truncates_backlog() {
        let manager = Arc::new(QueueManager::new());
        let publisher = manager.create_publisher("producer".to_string()).unwrap();
        let consumer = manager.create_consumer("worker".to_string()).unwrap();

        for i in 0..5 {
            publisher
                .publish(test_message("producer", &format!("m{}", i)))
                .unwrap();
        }
        assert_eq!(manager.capacity(), 10_000);

        assert!(manager.resize(2));
        assert_eq!(manager.capacity(), 2);
        assert_eq!(manager.message_count(), 2);

        // The consumer's cursor was in the evicted prefix; it continues
        // from the oldest surviving message.
        assert_eq!(consumer.try_recv().unwrap().unwrap().data, "m3");
        assert_eq!(consumer.try_recv().unwrap().unwrap().data, "m4");
        assert!(consumer.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_queue_stats() {
        let manager = Arc::new(QueueManager::new());
        let publisher = manager.create_publisher("producer".to_string()).unwrap();
        let _consumer = manager.create_consumer("worker".to_string()).unwrap();

        publisher.publish(test_message("producer", "m")).unwrap();

        let stats = manager.stats();
        assert_eq!(stats.depth, 1);
        assert_eq!(stats.capacity, 10_000);
        assert_eq!(stats.subscribers, 1);
        assert_eq!(stats.next_sequence, 2);
    }
}
