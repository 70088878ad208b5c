use crate::models::{Order, OrderChange, OrderStatus, Transaction};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert_order(&self, order: &Order) -> Result<(), RepoError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError>;

    /// Compare-and-swap status update: the write applies only if the stored
    /// status still equals `expected`. Returns false when the guard misses,
    /// so concurrent conflicting transitions surface instead of clobbering
    /// each other. `delivered_at` is stamped together with the status when
    /// the transition completes delivery.
    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<bool, RepoError>;

    async fn link_transaction(&self, order_id: Uuid, transaction_id: Uuid)
        -> Result<(), RepoError>;

    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, RepoError>;

    /// Orders currently in flight for a restaurant (non-terminal status)
    async fn count_active_for_restaurant(&self, restaurant_id: Uuid) -> Result<u32, RepoError>;

    /// Delivered orders for a restaurant with `created_at >= since`, used by
    /// the historical delivery-time factor
    async fn list_delivered_since(
        &self,
        restaurant_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepoError>;

    async fn add_order_change(&self, change: &OrderChange) -> Result<(), RepoError>;
}

/// Repository trait for settlement transactions
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Insert iff no transaction exists for the order yet. Returns true when
    /// this call created the record, the idempotency guard for settlement
    /// finalization (idempotency key = order id).
    async fn create_if_absent(&self, transaction: &Transaction) -> Result<bool, RepoError>;

    async fn get_for_order(&self, order_id: Uuid) -> Result<Option<Transaction>, RepoError>;

    async fn list_completed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, RepoError>;
}
