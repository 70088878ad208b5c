use crate::models::{Order, OrderChange, OrderStatus, Transaction};
use crate::repository::{OrderRepository, RepoError, TransactionRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory order store used by tests and local development.
///
/// Implements the same compare-and-swap semantics the Postgres repository
/// provides, so lifecycle behavior under contention is testable without a
/// database.
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
    changes: RwLock<Vec<OrderChange>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            changes: RwLock::new(Vec::new()),
        }
    }

    /// Test helper: place an order into an arbitrary status directly
    pub async fn force_status(&self, order_id: Uuid, status: OrderStatus) {
        if let Some(order) = self.orders.write().await.get_mut(&order_id) {
            order.status = status;
        }
    }

    pub async fn changes_for(&self, order_id: Uuid) -> Vec<OrderChange> {
        self.changes
            .read()
            .await
            .iter()
            .filter(|c| c.order_id == order_id)
            .cloned()
            .collect()
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert_order(&self, order: &Order) -> Result<(), RepoError> {
        self.orders.write().await.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<bool, RepoError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&id) {
            Some(order) if order.status == expected => {
                order.update_status(next);
                if delivered_at.is_some() {
                    order.actual_delivery_at = delivered_at;
                }
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Ok(false),
        }
    }

    async fn link_transaction(
        &self,
        order_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<(), RepoError> {
        if let Some(order) = self.orders.write().await.get_mut(&order_id) {
            order.transaction_id = Some(transaction_id);
        }
        Ok(())
    }

    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, RepoError> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.customer.id == customer_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn count_active_for_restaurant(&self, restaurant_id: Uuid) -> Result<u32, RepoError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.restaurant_id == restaurant_id && !o.status.is_terminal())
            .count() as u32)
    }

    async fn list_delivered_since(
        &self,
        restaurant_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepoError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .filter(|o| {
                o.restaurant_id == restaurant_id
                    && o.status == OrderStatus::Delivered
                    && o.created_at >= since
            })
            .cloned()
            .collect())
    }

    async fn add_order_change(&self, change: &OrderChange) -> Result<(), RepoError> {
        self.changes.write().await.push(change.clone());
        Ok(())
    }
}

/// In-memory settlement store with the one-transaction-per-order guard
pub struct InMemoryTransactionRepository {
    by_order: RwLock<HashMap<Uuid, Transaction>>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self {
            by_order: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.by_order.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.by_order.read().await.is_empty()
    }
}

impl Default for InMemoryTransactionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn create_if_absent(&self, transaction: &Transaction) -> Result<bool, RepoError> {
        let mut by_order = self.by_order.write().await;
        if by_order.contains_key(&transaction.order_id) {
            return Ok(false);
        }
        by_order.insert(transaction.order_id, transaction.clone());
        Ok(true)
    }

    async fn get_for_order(&self, order_id: Uuid) -> Result<Option<Transaction>, RepoError> {
        Ok(self.by_order.read().await.get(&order_id).cloned())
    }

    async fn list_completed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, RepoError> {
        Ok(self
            .by_order
            .read()
            .await
            .values()
            .filter(|t| {
                t.status == crate::models::TransactionStatus::Completed
                    && t.created_at >= from
                    && t.created_at < to
            })
            .cloned()
            .collect())
    }
}
