use crate::commission;
use crate::events::{OrderEvent, OrderEventSink};
use crate::models::{NewOrder, Order, OrderChange, OrderStatus, Transaction};
use crate::repository::{OrderRepository, RepoError, TransactionRepository};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Manages order lifecycle and state transitions.
///
/// All collaborators are injected: persistence behind `OrderRepository` /
/// `TransactionRepository`, notification fan-out behind `OrderEventSink`.
pub struct OrderLifecycle {
    orders: Arc<dyn OrderRepository>,
    transactions: Arc<dyn TransactionRepository>,
    events: Arc<dyn OrderEventSink>,
    commission_rate: f64,
}

impl OrderLifecycle {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        transactions: Arc<dyn TransactionRepository>,
        events: Arc<dyn OrderEventSink>,
        commission_rate: f64,
    ) -> Self {
        Self {
            orders,
            transactions,
            events,
            commission_rate,
        }
    }

    /// Create a new order in PENDING state.
    ///
    /// The settlement snapshot is computed before the single persistence
    /// write, so a storage failure leaves nothing behind. Notification
    /// dispatch happens after the write and cannot fail the call.
    pub async fn create_order(&self, draft: NewOrder) -> Result<Order, OrderError> {
        if draft.items.is_empty() {
            return Err(OrderError::Validation("order has no items".to_string()));
        }
        if draft.items.iter().any(|item| item.quantity == 0) {
            return Err(OrderError::Validation(
                "every line item needs a quantity greater than zero".to_string(),
            ));
        }
        if draft.restaurant_id.is_nil() {
            return Err(OrderError::Validation("restaurant id is missing".to_string()));
        }
        let subtotal = draft.subtotal();
        if subtotal <= 0.0 {
            return Err(OrderError::Validation(format!(
                "order subtotal must be positive, got {subtotal}"
            )));
        }

        let settlement = commission::split(subtotal, self.commission_rate);
        let order = Order::from_draft(draft, settlement);

        self.orders
            .insert_order(&order)
            .await
            .map_err(OrderError::repository)?;

        self.record_change(
            order.id,
            "CREATED",
            None,
            Some(serde_json::json!({ "status": order.status })),
            &format!("customer:{}", order.customer.id),
            None,
        )
        .await;

        tracing::info!(order_id = %order.id, total = order.total, "order created");
        let telemetry = morsel_shared::models::events::OrderPlacedEvent {
            order_id: order.id,
            restaurant_id: order.restaurant_id,
            customer_id: order.customer.id.clone(),
            total: order.total,
            timestamp: order.created_at.timestamp(),
        };
        tracing::debug!(target: "morsel::telemetry", event = ?telemetry, "order placed");

        self.events.publish(OrderEvent::Placed {
            order: order.clone(),
        });

        Ok(order)
    }

    /// Apply a status transition.
    ///
    /// `actor` is an opaque audit tag (e.g. "staff:42" or "channel:99817");
    /// it is recorded for traceability, not used for authorization.
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        actor: &str,
    ) -> Result<Order, OrderError> {
        let mut order = self.get_order(order_id).await?;

        // Duplicate delivery confirmations are tolerated: the settlement
        // guard makes the repeat a no-op instead of an error.
        if order.status == OrderStatus::Delivered && new_status == OrderStatus::Delivered {
            self.finalize_settlement(&mut order).await?;
            return Ok(order);
        }

        if !order.status.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: order.status.to_string(),
                to: new_status.to_string(),
            });
        }

        let delivered_at = (new_status == OrderStatus::Delivered).then(Utc::now);

        let applied = self
            .orders
            .update_status(order_id, order.status, new_status, delivered_at)
            .await
            .map_err(OrderError::repository)?;
        if !applied {
            return Err(OrderError::Conflict(format!(
                "order {order_id} changed concurrently, re-read and retry"
            )));
        }

        let previous = order.status;
        order.update_status(new_status);
        order.actual_delivery_at = delivered_at;

        if new_status == OrderStatus::Delivered {
            self.finalize_settlement(&mut order).await?;
        }

        self.record_change(
            order_id,
            "STATUS_CHANGED",
            Some(serde_json::json!({ "status": previous })),
            Some(serde_json::json!({ "status": new_status })),
            actor,
            None,
        )
        .await;

        tracing::info!(
            order_id = %order_id,
            from = %previous,
            to = %new_status,
            actor,
            "order status changed"
        );
        let telemetry = morsel_shared::models::events::OrderStatusChangedEvent {
            order_id,
            previous_status: previous.to_string(),
            new_status: new_status.to_string(),
            actor: actor.to_string(),
            timestamp: order.updated_at.timestamp(),
        };
        tracing::debug!(target: "morsel::telemetry", event = ?telemetry, "status changed");

        self.events.publish(OrderEvent::StatusChanged {
            order: order.clone(),
            previous,
        });

        Ok(order)
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.orders
            .get_order(order_id)
            .await
            .map_err(OrderError::repository)?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    /// Settlement finalization, guarded by the one-transaction-per-order
    /// idempotency key. Safe against duplicate delivery confirmations
    /// arriving concurrently.
    async fn finalize_settlement(&self, order: &mut Order) -> Result<(), OrderError> {
        let mut transaction = Transaction::for_order(order);
        transaction.complete();

        let created = self
            .transactions
            .create_if_absent(&transaction)
            .await
            .map_err(OrderError::repository)?;

        if created {
            self.orders
                .link_transaction(order.id, transaction.id)
                .await
                .map_err(OrderError::repository)?;
            order.transaction_id = Some(transaction.id);

            self.record_change(
                order.id,
                "SETTLEMENT_FINALIZED",
                None,
                Some(serde_json::json!({
                    "transaction_id": transaction.id,
                    "restaurant_amount": transaction.restaurant_amount,
                    "commission_amount": transaction.commission_amount,
                })),
                "system:settlement",
                None,
            )
            .await;

            tracing::info!(
                order_id = %order.id,
                transaction_id = %transaction.id,
                restaurant_amount = transaction.restaurant_amount,
                "settlement finalized"
            );
            let telemetry = morsel_shared::models::events::SettlementRecordedEvent {
                order_id: order.id,
                transaction_id: transaction.id,
                gross_amount: transaction.gross_amount,
                commission_amount: transaction.commission_amount,
                restaurant_amount: transaction.restaurant_amount,
                timestamp: transaction.created_at.timestamp(),
            };
            tracing::debug!(target: "morsel::telemetry", event = ?telemetry, "settlement recorded");
        } else if order.transaction_id.is_none() {
            let existing = self
                .transactions
                .get_for_order(order.id)
                .await
                .map_err(OrderError::repository)?;
            order.transaction_id = existing.map(|t| t.id);
            tracing::debug!(order_id = %order.id, "settlement already finalized, no-op");
        }

        Ok(())
    }

    /// Audit writes are best-effort and never fail the operation they trace
    async fn record_change(
        &self,
        order_id: Uuid,
        change_type: &str,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
        actor: &str,
        note: Option<&str>,
    ) {
        let change = OrderChange {
            id: Uuid::new_v4(),
            order_id,
            change_type: change_type.to_string(),
            old_value,
            new_value,
            actor: actor.to_string(),
            note: note.map(str::to_string),
            created_at: Utc::now(),
        };
        if let Err(err) = self.orders.add_order_change(&change).await {
            tracing::warn!(order_id = %order_id, error = %err, "failed to record order change");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Concurrent update conflict: {0}")]
    Conflict(String),

    #[error("Repository failure: {0}")]
    Repository(String),
}

impl OrderError {
    fn repository(err: RepoError) -> Self {
        OrderError::Repository(err.to_string())
    }
}
