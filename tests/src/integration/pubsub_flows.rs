//! # Publish/Subscribe Flows
//!
//! ```text
//! [publisher] ──publish("news")──→ [MessageBus] ──→ [queue A]
//!                                       │
//!                                       └──────────→ [queue B]
//! ```
//!
//! 1. **Routing**: exact topic match, no cross-talk
//! 2. **Fan-out**: every subscriber of a topic gets its own copy
//! 3. **Unsubscribe**: removal is targeted and idempotent

#[cfg(test)]
mod tests {
    use crate::init_tracing;
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;
    use topic_bus::{IdGenerator, MessageBus, SubscriptionError, TopicMessage, UuidGenerator};

    fn news(payload: &str) -> TopicMessage<String> {
        TopicMessage::new("news", payload.to_string())
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_returns_immediately() {
        init_tracing();
        let bus = MessageBus::<String>::new();

        timeout(Duration::from_millis(100), bus.publish(news("hi")))
            .await
            .expect("publish to an empty topic must not block");

        assert_eq!(bus.stats().published, 1);
        assert_eq!(bus.stats().delivered, 0);
    }

    #[tokio::test]
    async fn test_single_subscriber_receives_exactly_once() {
        init_tracing();
        let bus = MessageBus::<String>::new();
        let mut a = bus.subscribe_channel("news", 10).expect("subscribe");

        bus.publish(news("hi")).await;
        bus.publish(TopicMessage::new("sports", "goal".to_string()))
            .await;

        let received = a.recv().await.expect("message");
        assert_eq!(received.topic().as_str(), "news");
        assert_eq!(received.payload(), "hi");
        assert_eq!(a.try_recv(), Ok(None));
    }

    #[tokio::test]
    async fn test_fan_out_to_all_subscribers() {
        init_tracing();
        let bus = MessageBus::<String>::new();
        let mut a = bus.subscribe_channel("news", 10).expect("subscribe");
        let mut b = bus.subscribe_channel("news", 10).expect("subscribe");
        let mut other = bus.subscribe_channel("sports", 10).expect("subscribe");

        let report = bus.publish_with_report(news("hi")).await;

        assert_eq!(report.attempted, 2);
        assert!(report.is_complete());
        assert_eq!(a.try_recv(), Ok(Some(news("hi"))));
        assert_eq!(b.try_recv(), Ok(Some(news("hi"))));
        assert_eq!(other.try_recv(), Ok(None));
    }

    #[tokio::test]
    async fn test_unsubscribed_queue_no_longer_receives() {
        init_tracing();
        let bus = MessageBus::<String>::new();
        let mut a = bus.subscribe_channel("news", 10).expect("subscribe");
        let mut b = bus.subscribe_channel("news", 10).expect("subscribe");

        bus.unsubscribe("news", a.id());
        bus.publish(news("hi")).await;

        assert_eq!(b.try_recv(), Ok(Some(news("hi"))));
        // A's sender was dropped with the registry entry.
        assert_eq!(a.try_recv(), Err(SubscriptionError::Closed));
    }

    #[tokio::test]
    async fn test_unsubscribe_never_subscribed_is_harmless() {
        init_tracing();
        let bus = MessageBus::<String>::new();
        let mut a = bus.subscribe_channel("news", 10).expect("subscribe");

        bus.unsubscribe("news", UuidGenerator.next_id());
        bus.unsubscribe("weather", a.id());
        bus.unsubscribe("weather", UuidGenerator.next_id());

        bus.publish(news("still here")).await;
        assert_eq!(a.try_recv(), Ok(Some(news("still here"))));
    }

    #[tokio::test]
    async fn test_resubscribe_yields_new_id() {
        init_tracing();
        let bus = MessageBus::<String>::new();
        let (tx, mut rx) = mpsc::channel(4);

        let first = bus.subscribe("news", tx.clone()).expect("subscribe");
        bus.unsubscribe("news", first);
        let second = bus.subscribe("news", tx).expect("subscribe");

        assert_ne!(first, second);
        bus.publish(news("hi")).await;
        assert_eq!(rx.recv().await, Some(news("hi")));
    }

    #[tokio::test]
    async fn test_same_queue_under_two_topics() {
        init_tracing();
        let bus = MessageBus::<String>::new();
        let (tx, mut rx) = mpsc::channel(4);

        let news_id = bus.subscribe("news", tx.clone()).expect("subscribe");
        let sports_id = bus.subscribe("sports", tx).expect("subscribe");
        assert_ne!(news_id, sports_id);

        bus.publish(news("a")).await;
        bus.publish(TopicMessage::new("sports", "b".to_string())).await;

        assert_eq!(rx.recv().await.map(TopicMessage::into_payload), Some("a".to_string()));
        assert_eq!(rx.recv().await.map(TopicMessage::into_payload), Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_subscriber_sees_publish_order() {
        init_tracing();
        let bus = MessageBus::<u64>::new();
        let sub = bus.subscribe_channel("ticks", 100).expect("subscribe");

        for i in 0..50 {
            bus.publish(TopicMessage::new("ticks", i)).await;
        }

        let received: Vec<u64> = sub
            .into_stream()
            .take(50)
            .map(TopicMessage::into_payload)
            .collect()
            .await;
        assert_eq!(received, (0..50).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_structured_payloads() {
        #[derive(Debug, Clone, PartialEq)]
        struct Order {
            id: u32,
            qty: u16,
        }

        init_tracing();
        let bus = MessageBus::<Order>::new();
        let mut sub = bus.subscribe_default("orders").expect("subscribe");

        bus.publish(TopicMessage::new("orders", Order { id: 7, qty: 3 }))
            .await;

        let order = sub.recv().await.expect("order").into_payload();
        assert_eq!(order, Order { id: 7, qty: 3 });
    }
}
