use chrono::{DateTime, Utc};
use morsel_catalog::ProductCategory;
use morsel_shared::pii::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order status in the delivery lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Assigned,
    PickedUp,
    Delivering,
    Arrived,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 11] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Assigned,
        OrderStatus::PickedUp,
        OrderStatus::Delivering,
        OrderStatus::Arrived,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];

    /// Position in the Pending -> Delivered progression; None for the
    /// failure/compensation states.
    pub fn chain_position(&self) -> Option<usize> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Preparing => Some(2),
            OrderStatus::Ready => Some(3),
            OrderStatus::Assigned => Some(4),
            OrderStatus::PickedUp => Some(5),
            OrderStatus::Delivering => Some(6),
            OrderStatus::Arrived => Some(7),
            OrderStatus::Delivered => Some(8),
            OrderStatus::Cancelled | OrderStatus::Refunded => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }

    /// Legality of a requested transition. Forward moves along the chain may
    /// skip stages; Cancelled/Refunded are reachable from any non-terminal
    /// status; terminal states accept nothing.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if matches!(next, OrderStatus::Cancelled | OrderStatus::Refunded) {
            return true;
        }
        match (self.chain_position(), next.chain_position()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Assigned => "ASSIGNED",
            OrderStatus::PickedUp => "PICKED_UP",
            OrderStatus::Delivering => "DELIVERING",
            OrderStatus::Arrived => "ARRIVED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .iter()
            .find(|status| status.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method tag; actual gateway integration lives outside the core
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CashOnDelivery,
    CardOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "CASH_ON_DELIVERY",
            PaymentMethod::CardOnDelivery => "CARD_ON_DELIVERY",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH_ON_DELIVERY" => Ok(PaymentMethod::CashOnDelivery),
            "CARD_ON_DELIVERY" => Ok(PaymentMethod::CardOnDelivery),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Customer reference carried on the order; contact fields are masked in logs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Masked<String>,
    pub email: Masked<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    pub postal_code: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl DeliveryAddress {
    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

    pub fn summary_line(&self) -> String {
        format!("{}, {}", self.street, self.city)
    }
}

/// A product snapshot captured at order time; catalog price changes after
/// creation never touch this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub category: ProductCategory,
    pub unit_price: f64,
    pub quantity: u32,
    pub note: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// How an order's subtotal splits between the restaurant and the platform.
/// Computed once at creation with the rate in effect at that instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettlementSnapshot {
    pub subtotal: f64,
    pub commission_rate: f64,
    pub commission_amount: f64,
    pub restaurant_earning: f64,
    pub platform_earning: f64,
}

/// Validated input for order creation, with catalog snapshots already resolved
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer: Customer,
    pub restaurant_id: Uuid,
    pub items: Vec<OrderItem>,
    pub delivery_fee: f64,
    pub payment_method: PaymentMethod,
    pub delivery_address: DeliveryAddress,
    pub special_instructions: Option<String>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
}

impl NewOrder {
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(|item| item.line_total()).sum()
    }
}

/// The single source of truth for a customer's purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer: Customer,
    pub restaurant_id: Uuid,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub delivery_address: DeliveryAddress,
    pub settlement: SettlementSnapshot,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub actual_delivery_at: Option<DateTime<Utc>>,
    pub special_instructions: Option<String>,
    pub transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn from_draft(draft: NewOrder, settlement: SettlementSnapshot) -> Self {
        let now = Utc::now();
        let subtotal = draft.subtotal();
        Self {
            id: Uuid::new_v4(),
            customer: draft.customer,
            restaurant_id: draft.restaurant_id,
            items: draft.items,
            subtotal,
            delivery_fee: draft.delivery_fee,
            total: subtotal + draft.delivery_fee,
            status: OrderStatus::Pending,
            payment_method: draft.payment_method,
            delivery_address: draft.delivery_address,
            settlement,
            estimated_delivery_at: draft.estimated_delivery_at,
            actual_delivery_at: None,
            special_instructions: draft.special_instructions,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update order status
    pub fn update_status(&mut self, new_status: OrderStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    /// Realized delivery duration in minutes, once the order is delivered
    pub fn delivery_duration_minutes(&self) -> Option<f64> {
        self.actual_delivery_at
            .map(|at| (at - self.created_at).num_seconds() as f64 / 60.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "COMPLETED" => Ok(TransactionStatus::Completed),
            "FAILED" => Ok(TransactionStatus::Failed),
            other => Err(format!("unknown transaction status: {other}")),
        }
    }
}

/// Settlement record created exactly once per order, at delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub order_id: Uuid,
    pub restaurant_id: Uuid,
    pub gross_amount: f64,
    pub commission_amount: f64,
    pub restaurant_amount: f64,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn for_order(order: &Order) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id: order.id,
            restaurant_id: order.restaurant_id,
            gross_amount: order.settlement.subtotal,
            commission_amount: order.settlement.commission_amount,
            restaurant_amount: order.settlement.restaurant_earning,
            payment_method: order.payment_method,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Mark the money as conceptually moved
    pub fn complete(&mut self) {
        self.status = TransactionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self) {
        self.status = TransactionStatus::Failed;
        self.completed_at = Some(Utc::now());
    }
}

/// Audit entry recorded for every order mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderChange {
    pub id: Uuid,
    pub order_id: Uuid,
    pub change_type: String,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
    pub actor: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_customer() -> Customer {
        Customer {
            id: "cust-1".to_string(),
            name: "Ada".to_string(),
            phone: Masked("+90 555 000 0001".to_string()),
            email: Masked("ada@example.com".to_string()),
        }
    }

    fn test_address() -> DeliveryAddress {
        DeliveryAddress {
            street: "12 Harbour St".to_string(),
            city: "Izmir".to_string(),
            postal_code: None,
            lat: None,
            lng: None,
        }
    }

    #[test]
    fn total_is_subtotal_plus_fee_at_creation() {
        let draft = NewOrder {
            customer: test_customer(),
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
            delivery_address: test_address(),
            special_instructions: None,
            estimated_delivery_at: None,
        };

        let settlement = crate::commission::split(draft.subtotal(), 0.09);
        let order = Order::from_draft(draft, settlement);

        assert_eq!(order.subtotal, 90.0);
        assert_eq!(order.total, 105.0);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn forward_transitions_may_skip_stages() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Preparing.can_transition_to(OrderStatus::Delivering));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn backward_and_terminal_transitions_are_rejected() {
        assert!(!OrderStatus::Delivering.can_transition_to(OrderStatus::Preparing));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Refunded.can_transition_to(OrderStatus::Refunded));
    }

    #[test]
    fn cancellation_is_reachable_from_any_non_terminal_status() {
        for status in OrderStatus::ALL {
            if status.is_terminal() {
                continue;
            }
            assert!(status.can_transition_to(OrderStatus::Cancelled));
            assert!(status.can_transition_to(OrderStatus::Refunded));
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in OrderStatus::ALL {
            let parsed: OrderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("EATEN".parse::<OrderStatus>().is_err());
    }
}
