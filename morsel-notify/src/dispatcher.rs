use crate::channel::ChannelAdapter;
use crate::render::Notification;
use morsel_order::events::{OrderEvent, OrderEventSink};
use std::sync::Arc;

/// Fans one lifecycle event out to every registered channel.
///
/// Each adapter runs in its own detached task: a slow or failing channel
/// cannot delay or fail its siblings, and nothing propagates to the caller.
/// Delivery is at-most-once by policy: there is no retry, backoff or
/// dead-letter queue; a failed send is logged and dropped.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn ChannelAdapter>>,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn ChannelAdapter>>) -> Self {
        Self { channels }
    }

    pub fn dispatch(&self, event: &OrderEvent) {
        let notification = Arc::new(Notification::from_event(event));

        for channel in &self.channels {
            let channel = Arc::clone(channel);
            let notification = Arc::clone(&notification);

            tokio::spawn(async move {
                match channel.send(&notification).await {
                    Ok(()) => {
                        tracing::debug!(
                            channel = channel.name(),
                            order_id = %notification.order_id,
                            "notification delivered"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(
                            channel = channel.name(),
                            order_id = %notification.order_id,
                            error = %err,
                            "notification send failed, dropping"
                        );
                        let telemetry = morsel_shared::models::events::ChannelFailureEvent {
                            order_id: notification.order_id,
                            channel: channel.name().to_string(),
                            reason: err.to_string(),
                            timestamp: chrono::Utc::now().timestamp(),
                        };
                        tracing::debug!(target: "morsel::telemetry", event = ?telemetry, "channel failure");
                    }
                }
            });
        }
    }
}

impl OrderEventSink for NotificationDispatcher {
    fn publish(&self, event: OrderEvent) {
        self.dispatch(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelError;
    use async_trait::async_trait;
    use morsel_catalog::ProductCategory;
    use morsel_order::models::{
        Customer, DeliveryAddress, NewOrder, Order, OrderItem, PaymentMethod,
    };
    use morsel_shared::pii::Masked;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    struct CountingChannel {
        name: &'static str,
        deliveries: AtomicUsize,
    }

    impl CountingChannel {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                deliveries: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChannelAdapter for CountingChannel {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn send(&self, _notification: &Notification) -> Result<(), ChannelError> {
            self.deliveries.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingChannel;

    #[async_trait]
    impl ChannelAdapter for FailingChannel {
        fn name(&self) -> &'static str {
            "chat-bot"
        }

        async fn send(&self, _notification: &Notification) -> Result<(), ChannelError> {
            Err(ChannelError::Rejected("gateway down".to_string()))
        }
    }

    struct SlowChannel;

    #[async_trait]
    impl ChannelAdapter for SlowChannel {
        fn name(&self) -> &'static str {
            "email"
        }

        async fn send(&self, _notification: &Notification) -> Result<(), ChannelError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    fn placed_event() -> OrderEvent {
        let draft = NewOrder {
            customer: Customer {
                id: "cust-1".to_string(),
                name: "Ada".to_string(),
                phone: Masked("+90 555 000 0001".to_string()),
                email: Masked("ada@example.com".to_string()),
            },
            restaurant_id: Uuid::new_v4(),
            items: vec![OrderItem {
                product_id: Uuid::new_v4(),
                name: "Iskender".to_string(),
                category: ProductCategory::MainDish,
                unit_price: 45.0,
                quantity: 2,
                note: None,
            }],
            delivery_fee: 15.0,
            payment_method: PaymentMethod::CashOnDelivery,
            delivery_address: DeliveryAddress {
                street: "12 Harbour St".to_string(),
                city: "Izmir".to_string(),
                postal_code: None,
                lat: None,
                lng: None,
            },
            special_instructions: None,
            estimated_delivery_at: None,
        };
        let settlement = morsel_order::commission::split(draft.subtotal(), 0.09);
        OrderEvent::Placed {
            order: Order::from_draft(draft, settlement),
        }
    }

    #[tokio::test]
    async fn failing_channel_does_not_stop_its_siblings() {
        let messaging = Arc::new(CountingChannel::new("messaging"));
        let email = Arc::new(CountingChannel::new("email"));
        let dispatcher = NotificationDispatcher::new(vec![
            Arc::new(FailingChannel),
            messaging.clone(),
            email.clone(),
        ]);

        dispatcher.dispatch(&placed_event());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(messaging.deliveries.load(Ordering::SeqCst), 1);
        assert_eq!(email.deliveries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dispatch_returns_without_waiting_for_slow_channels() {
        let messaging = Arc::new(CountingChannel::new("messaging"));
        let dispatcher =
            NotificationDispatcher::new(vec![Arc::new(SlowChannel), messaging.clone()]);

        let started = std::time::Instant::now();
        dispatcher.dispatch(&placed_event());
        // The caller is back immediately; only the spawned tasks wait
        assert!(started.elapsed() < Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(messaging.deliveries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn every_channel_receives_the_same_event() {
        let channels: Vec<Arc<CountingChannel>> = ["chat-bot", "messaging", "email"]
            .iter()
            .map(|&name| Arc::new(CountingChannel::new(name)))
            .collect();
        let dispatcher = NotificationDispatcher::new(
            channels
                .iter()
                .map(|c| c.clone() as Arc<dyn ChannelAdapter>)
                .collect(),
        );

        dispatcher.dispatch(&placed_event());
        tokio::time::sleep(Duration::from_millis(50)).await;

        for channel in &channels {
            assert_eq!(channel.deliveries.load(Ordering::SeqCst), 1);
        }
    }
}
