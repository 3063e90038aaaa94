//! Bounded queue behaviour across tasks.

use routeguide::{BoundedQueue, QueueError, QueueMode};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_non_blocking_full_and_empty() {
    let queue = BoundedQueue::new("pending", 2);
    queue.put(1, QueueMode::NonBlocking).await.unwrap();
    queue.put(2, QueueMode::NonBlocking).await.unwrap();
    assert_eq!(
        queue.put(3, QueueMode::NonBlocking).await,
        Err(QueueError::Full {
            queue: "pending",
            capacity: 2
        })
    );

    assert_eq!(queue.get(QueueMode::NonBlocking).await, Ok(1));
    assert_eq!(queue.get(QueueMode::NonBlocking).await, Ok(2));
    assert_eq!(
        queue.get(QueueMode::NonBlocking).await,
        Err(QueueError::Empty { queue: "pending" })
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_consumer_throttles_producer() {
    let queue = Arc::new(BoundedQueue::new("results", 2));
    let producer = {
        let queue = queue.clone();
        tokio::spawn(async move {
            for item in 0..10 {
                queue
                    .put(item, QueueMode::BlockingFor(Duration::from_secs(5)))
                    .await
                    .unwrap();
                assert!(queue.len() <= 2);
            }
        })
    };

    let mut received = Vec::new();
    while received.len() < 10 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        received.push(
            queue
                .get(QueueMode::BlockingFor(Duration::from_secs(5)))
                .await
                .unwrap(),
        );
    }
    producer.await.unwrap();

    assert_eq!(received, (0..10).collect::<Vec<_>>());
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_blocking_get_times_out_on_idle_queue() {
    let queue: BoundedQueue<u8> = BoundedQueue::new("judgments", 1);
    let result = queue
        .get(QueueMode::BlockingFor(Duration::from_millis(30)))
        .await;
    assert!(matches!(result, Err(QueueError::Empty { .. })));
}
