//! Tests for concurrent queue operations
//!
//! Exercises the delivery contract under real thread interleavings:
//! every subscriber must see every message published while it was
//! registered, in publish order, exactly once, with backpressure
//! engaged throughout.

#[cfg(test)]
mod tests {
    use crate::queue::api::{BroadcastQueue, QueueConfig};
    use serial_test::serial;
    use std::sync::Arc;
    use std::thread;

    /// Route queue tracing through a real logger when debugging these
    /// tests (RUST_LOG=trace). The handle must outlive the process or
    /// logging stops, hence the static.
    fn init_test_logging() {
        use std::sync::OnceLock;
        static LOGGER: OnceLock<Option<flexi_logger::LoggerHandle>> = OnceLock::new();
        LOGGER.get_or_init(|| {
            flexi_logger::Logger::try_with_env_or_str("info")
                .and_then(|logger| logger.start())
                .ok()
        });
    }

    #[test]
    #[serial]
    fn test_exactly_once_in_order_delivery_under_contention() {
        init_test_logging();
        // Small capacity forces publishers through the backpressure path
        let queue = Arc::new(BroadcastQueue::new(8));
        let consumer_ids = [1u64, 2, 3];
        for id in consumer_ids {
            queue.subscribe(id).unwrap();
        }

        let per_publisher = 100;
        let publishers: Vec<_> = (1..=2)
            .map(|publisher_id| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for n in 0..per_publisher {
                        queue
                            .publish(Arc::new(format!("p{}-{}", publisher_id, n)))
                            .unwrap();
                    }
                })
            })
            .collect();

        let total = per_publisher * 2;
        let consumers: Vec<_> = consumer_ids
            .map(|id| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut seen = Vec::with_capacity(total);
                    for _ in 0..total {
                        seen.push((*queue.consume(id).unwrap()).clone());
                    }
                    seen
                })
            })
            .into_iter()
            .collect();

        for publisher in publishers {
            publisher.join().unwrap();
        }
        let transcripts: Vec<Vec<String>> = consumers
            .into_iter()
            .map(|consumer| consumer.join().unwrap())
            .collect();

        for transcript in &transcripts {
            assert_eq!(transcript.len(), total, "no gaps, no duplicates");
            // Each publisher's messages arrive in its publish order
            for publisher_id in 1..=2 {
                let prefix = format!("p{}-", publisher_id);
                let subsequence: Vec<&String> = transcript
                    .iter()
                    .filter(|data| data.starts_with(&prefix))
                    .collect();
                assert_eq!(subsequence.len(), per_publisher);
                for (n, data) in subsequence.iter().enumerate() {
                    assert_eq!(**data, format!("{}{}", prefix, n));
                }
            }
        }

        // All subscribers observe the same global publish order
        assert_eq!(transcripts[0], transcripts[1]);
        assert_eq!(transcripts[1], transcripts[2]);
        assert_eq!(queue.len(), 0, "everything consumed, nothing retained");
    }

    #[test]
    #[serial]
    fn test_concurrent_subscribe_unsubscribe_churn() {
        init_test_logging();
        let queue = Arc::new(BroadcastQueue::with_config(QueueConfig {
            capacity: 16,
            max_subscribers: 50,
        }));
        queue.subscribe(0).unwrap();

        let publisher = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for n in 0..200 {
                    queue.publish(Arc::new(format!("m{}", n))).unwrap();
                }
            })
        };

        // Churning subscribers join and leave while delivery is live;
        // their partial backlogs must be released cleanly each time.
        let churn = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for round in 0..50 {
                    let id = 1000 + round;
                    queue.subscribe(id).unwrap();
                    let _ = queue.try_consume(id);
                    queue.unsubscribe(id);
                }
            })
        };

        let mut received = 0;
        while received < 200 {
            let _ = queue.consume(0).unwrap();
            received += 1;
        }

        publisher.join().unwrap();
        churn.join().unwrap();

        assert_eq!(queue.len(), 0, "churn must not strand messages");
        assert_eq!(queue.subscriber_count(), 1);
    }

    #[test]
    #[serial]
    #[ignore = "slow"]
    fn test_delivery_stress() {
        init_test_logging();
        let queue = Arc::new(BroadcastQueue::new(32));
        let consumer_ids: Vec<u64> = (0..5).collect();
        for &id in &consumer_ids {
            queue.subscribe(id).unwrap();
        }

        let per_publisher = 2000;
        let publisher_count = 4;
        let publishers: Vec<_> = (0..publisher_count)
            .map(|publisher_id| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for n in 0..per_publisher {
                        queue
                            .publish(Arc::new(format!("p{}-{}", publisher_id, n)))
                            .unwrap();
                    }
                })
            })
            .collect();

        let total = per_publisher * publisher_count;
        let consumers: Vec<_> = consumer_ids
            .iter()
            .map(|&id| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut count = 0;
                    for _ in 0..total {
                        queue.consume(id).unwrap();
                        count += 1;
                    }
                    count
                })
            })
            .collect();

        for publisher in publishers {
            publisher.join().unwrap();
        }
        for consumer in consumers {
            assert_eq!(consumer.join().unwrap(), total);
        }
        assert_eq!(queue.len(), 0);
    }
}
