//! # Concurrent Access
//!
//! Subscribe, unsubscribe, and publish racing from independent tasks on a
//! multi-threaded runtime.

#[cfg(test)]
mod tests {
    use crate::init_tracing;
    use futures::future::join_all;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::time::timeout;
    use topic_bus::{MessageBus, SubscriptionId, TopicMessage};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribe_ids_are_distinct() {
        init_tracing();
        let bus = MessageBus::<u32>::new();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let bus = bus.clone();
                tokio::spawn(async move {
                    let mut ids = Vec::new();
                    for _ in 0..50 {
                        let sub = bus.subscribe_channel("shared", 1).expect("subscribe");
                        ids.push(sub.id());
                    }
                    ids
                })
            })
            .collect();

        let mut ids: HashSet<SubscriptionId> = HashSet::new();
        for handle in join_all(handles).await {
            for id in handle.expect("task") {
                assert!(ids.insert(id), "duplicate subscription id {id}");
            }
        }
        assert_eq!(ids.len(), 800);
        assert_eq!(bus.subscriber_count("shared"), 800);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_publishers_reach_every_subscriber() {
        init_tracing();
        let bus = MessageBus::<u32>::new();
        let mut subs: Vec<_> = (0..8)
            .map(|_| bus.subscribe_channel("events", 1000).expect("subscribe"))
            .collect();

        let publishers: Vec<_> = (0..4u32)
            .map(|p| {
                let bus = bus.clone();
                tokio::spawn(async move {
                    for i in 0..100 {
                        bus.publish(TopicMessage::new("events", p * 1000 + i)).await;
                    }
                })
            })
            .collect();
        for result in join_all(publishers).await {
            result.expect("publisher");
        }

        for sub in &mut subs {
            let mut seen = HashSet::new();
            while let Ok(Some(msg)) = sub.try_recv() {
                seen.insert(msg.into_payload());
            }
            assert_eq!(seen.len(), 400);
        }
        assert_eq!(bus.stats().delivered, 8 * 400);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_per_publisher_order_preserved() {
        init_tracing();
        let bus = MessageBus::<(u32, u32)>::new();
        let mut sub = bus.subscribe_channel("seq", 1000).expect("subscribe");

        let publishers: Vec<_> = (0..4u32)
            .map(|p| {
                let bus = bus.clone();
                tokio::spawn(async move {
                    for i in 0..100 {
                        bus.publish(TopicMessage::new("seq", (p, i))).await;
                    }
                })
            })
            .collect();
        join_all(publishers).await;

        let mut last = [None::<u32>; 4];
        while let Ok(Some(msg)) = sub.try_recv() {
            let (p, i) = msg.into_payload();
            let slot = &mut last[p as usize];
            assert!(slot.map_or(true, |prev| prev < i), "publisher {p} reordered");
            *slot = Some(i);
        }
        assert_eq!(last, [Some(99); 4]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_churn_during_publish() {
        init_tracing();
        let bus = MessageBus::<u32>::builder()
            .delivery_timeout(Duration::from_millis(50))
            .build()
            .expect("valid config");
        let mut anchor = bus.subscribe_channel("churn", 1000).expect("subscribe");

        let churner = {
            let bus = bus.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    // Room for every publish, so a transient queue never fills.
                    let sub = bus.subscribe_channel("churn", 256).expect("subscribe");
                    tokio::task::yield_now().await;
                    bus.unsubscribe("churn", sub.id());
                }
            })
        };
        let publisher = {
            let bus = bus.clone();
            tokio::spawn(async move {
                for i in 0..200 {
                    bus.publish(TopicMessage::new("churn", i)).await;
                }
            })
        };

        timeout(Duration::from_secs(2), async {
            churner.await.expect("churner");
            publisher.await.expect("publisher");
        })
        .await
        .expect("churn must not stall publishing");

        let mut count = 0;
        while let Ok(Some(_)) = anchor.try_recv() {
            count += 1;
        }
        assert_eq!(count, 200);
        assert_eq!(bus.subscriber_count("churn"), 1);
    }
}
