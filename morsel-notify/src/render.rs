use chrono::{DateTime, Utc};
use morsel_order::events::OrderEvent;
use morsel_order::models::OrderStatus;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    NewOrder,
    StatusChanged,
}

/// Channel-neutral view of a lifecycle event.
///
/// Each adapter turns this into its own wire payload; the dispatcher builds
/// it once per event so a failing adapter cannot corrupt what its siblings
/// see.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: EventKind,
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub previous_status: Option<OrderStatus>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub item_lines: Vec<String>,
    pub total: f64,
    pub address_line: String,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub special_instructions: Option<String>,
}

impl Notification {
    pub fn from_event(event: &OrderEvent) -> Self {
        let (kind, previous_status) = match event {
            OrderEvent::Placed { .. } => (EventKind::NewOrder, None),
            OrderEvent::StatusChanged { previous, .. } => {
                (EventKind::StatusChanged, Some(*previous))
            }
        };
        let order = event.order();

        Self {
            kind,
            order_id: order.id,
            status: order.status,
            previous_status,
            customer_name: order.customer.name.clone(),
            customer_phone: order.customer.phone.0.clone(),
            customer_email: order.customer.email.0.clone(),
            item_lines: order
                .items
                .iter()
                .map(|item| {
                    let mut line =
                        format!("{}x {} ({:.2})", item.quantity, item.name, item.line_total());
                    if let Some(note) = &item.note {
                        line.push_str(&format!(" - {note}"));
                    }
                    line
                })
                .collect(),
            total: order.total,
            address_line: order.delivery_address.summary_line(),
            estimated_delivery_at: order.estimated_delivery_at,
            special_instructions: order.special_instructions.clone(),
        }
    }

    pub fn subject(&self) -> String {
        match self.kind {
            EventKind::NewOrder => format!("New order #{}", short_id(self.order_id)),
            EventKind::StatusChanged => format!(
                "Order #{} is now {}",
                short_id(self.order_id),
                self.status
            ),
        }
    }

    /// Plain-text body shared by the messaging and email renderings
    pub fn body(&self) -> String {
        let mut lines = vec![self.subject()];
        lines.push(format!("Customer: {} ({})", self.customer_name, self.customer_phone));
        lines.extend(self.item_lines.iter().cloned());
        lines.push(format!("Total: {:.2}", self.total));
        lines.push(format!("Deliver to: {}", self.address_line));
        if let Some(eta) = self.estimated_delivery_at {
            lines.push(format!("Estimated delivery: {}", eta.format("%H:%M")));
        }
        if let Some(instructions) = &self.special_instructions {
            lines.push(format!("Note: {instructions}"));
        }
        lines.join("\n")
    }
}

pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use morsel_catalog::ProductCategory;
    use morsel_order::models::{
        Customer, DeliveryAddress, NewOrder, Order, OrderItem, PaymentMethod,
    };
    use morsel_shared::pii::Masked;

    fn order() -> Order {
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
                note: Some("no butter".to_string()),
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
            special_instructions: Some("ring the bell".to_string()),
            estimated_delivery_at: None,
        };
        let settlement = morsel_order::commission::split(draft.subtotal(), 0.09);
        Order::from_draft(draft, settlement)
    }

    #[test]
    fn new_order_rendering_carries_items_and_total() {
        let order = order();
        let notification = Notification::from_event(&OrderEvent::Placed {
            order: order.clone(),
        });

        assert_eq!(notification.kind, EventKind::NewOrder);
        let body = notification.body();
        assert!(body.contains("2x Iskender"));
        assert!(body.contains("no butter"));
        assert!(body.contains("Total: 105.00"));
        assert!(body.contains("12 Harbour St, Izmir"));
        assert!(body.contains("ring the bell"));
    }

    #[test]
    fn status_change_rendering_names_the_new_status() {
        let mut order = order();
        let previous = order.status;
        order.update_status(OrderStatus::Confirmed);

        let notification =
            Notification::from_event(&OrderEvent::StatusChanged { order, previous });
        assert_eq!(notification.previous_status, Some(OrderStatus::Pending));
        assert!(notification.subject().contains("CONFIRMED"));
    }
}
