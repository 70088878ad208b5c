use async_trait::async_trait;
use chrono::{DateTime, Utc};
use morsel_order::models::{
    Customer, DeliveryAddress, Order, OrderChange, OrderItem, OrderStatus, SettlementSnapshot,
};
use morsel_order::repository::{OrderRepository, RepoError};
use morsel_shared::pii::Masked;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_id: String,
    customer_name: String,
    customer_phone: String,
    customer_email: String,
    restaurant_id: Uuid,
    subtotal: f64,
    delivery_fee: f64,
    total: f64,
    status: String,
    payment_method: String,
    address_street: String,
    address_city: String,
    address_postal_code: Option<String>,
    address_lat: Option<f64>,
    address_lng: Option<f64>,
    commission_rate: f64,
    commission_amount: f64,
    restaurant_earning: f64,
    platform_earning: f64,
    estimated_delivery_at: Option<DateTime<Utc>>,
    actual_delivery_at: Option<DateTime<Utc>>,
    special_instructions: Option<String>,
    transaction_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    product_id: Uuid,
    name: String,
    category: String,
    unit_price: f64,
    quantity: i32,
    note: Option<String>,
}

const ORDER_COLUMNS: &str = "id, customer_id, customer_name, customer_phone, customer_email, \
     restaurant_id, subtotal, delivery_fee, total, status, payment_method, \
     address_street, address_city, address_postal_code, address_lat, address_lng, \
     commission_rate, commission_amount, restaurant_earning, platform_earning, \
     estimated_delivery_at, actual_delivery_at, special_instructions, transaction_id, \
     created_at, updated_at";

impl PgOrderRepository {
    fn assemble(row: OrderRow, item_rows: Vec<OrderItemRow>) -> Result<Order, RepoError> {
        let items = item_rows
            .into_iter()
            .map(|item| {
                Ok(OrderItem {
                    product_id: item.product_id,
                    name: item.name,
                    category: item.category.parse()?,
                    unit_price: item.unit_price,
                    quantity: item.quantity as u32,
                    note: item.note,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;

        Ok(Order {
            id: row.id,
            customer: Customer {
                id: row.customer_id,
                name: row.customer_name,
                phone: Masked(row.customer_phone),
                email: Masked(row.customer_email),
            },
            restaurant_id: row.restaurant_id,
            items,
            subtotal: row.subtotal,
            delivery_fee: row.delivery_fee,
            total: row.total,
            status: row.status.parse::<OrderStatus>()?,
            payment_method: row.payment_method.parse()?,
            delivery_address: DeliveryAddress {
                street: row.address_street,
                city: row.address_city,
                postal_code: row.address_postal_code,
                lat: row.address_lat,
                lng: row.address_lng,
            },
            settlement: SettlementSnapshot {
                subtotal: row.subtotal,
                commission_rate: row.commission_rate,
                commission_amount: row.commission_amount,
                restaurant_earning: row.restaurant_earning,
                platform_earning: row.platform_earning,
            },
            estimated_delivery_at: row.estimated_delivery_at,
            actual_delivery_at: row.actual_delivery_at,
            special_instructions: row.special_instructions,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn items_for(&self, order_id: Uuid) -> Result<Vec<OrderItemRow>, sqlx::Error> {
        sqlx::query_as::<_, OrderItemRow>(
            "SELECT product_id, name, category, unit_price, quantity, note \
             FROM order_items WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert_order(&self, order: &Order) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, customer_id, customer_name, customer_phone, customer_email, \
             restaurant_id, subtotal, delivery_fee, total, status, payment_method, \
             address_street, address_city, address_postal_code, address_lat, address_lng, \
             commission_rate, commission_amount, restaurant_earning, platform_earning, \
             estimated_delivery_at, special_instructions, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21, $22, $23, $24)",
        )
        .bind(order.id)
        .bind(&order.customer.id)
        .bind(&order.customer.name)
        .bind(&order.customer.phone.0)
        .bind(&order.customer.email.0)
        .bind(order.restaurant_id)
        .bind(order.subtotal)
        .bind(order.delivery_fee)
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(order.payment_method.as_str())
        .bind(&order.delivery_address.street)
        .bind(&order.delivery_address.city)
        .bind(&order.delivery_address.postal_code)
        .bind(order.delivery_address.lat)
        .bind(order.delivery_address.lng)
        .bind(order.settlement.commission_rate)
        .bind(order.settlement.commission_amount)
        .bind(order.settlement.restaurant_earning)
        .bind(order.settlement.platform_earning)
        .bind(order.estimated_delivery_at)
        .bind(&order.special_instructions)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, name, category, unit_price, \
                 quantity, note) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(Uuid::new_v4())
            .bind(order.id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.category.as_str())
            .bind(item.unit_price)
            .bind(item.quantity as i32)
            .bind(&item.note)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.items_for(id).await?;
                Ok(Some(Self::assemble(row, items)?))
            }
            None => Ok(None),
        }
    }

    async fn update_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<bool, RepoError> {
        // Compare-and-swap on (id, expected status): a concurrent transition
        // that got there first makes this a zero-row update.
        let result = sqlx::query(
            "UPDATE orders SET status = $1, updated_at = NOW(), \
             actual_delivery_at = COALESCE($2, actual_delivery_at) \
             WHERE id = $3 AND status = $4",
        )
        .bind(next.as_str())
        .bind(delivered_at)
        .bind(id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn link_transaction(&self, order_id: Uuid, transaction_id: Uuid) -> Result<(), RepoError> {
        sqlx::query("UPDATE orders SET transaction_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(transaction_id)
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<Order>, RepoError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(row.id).await?;
            orders.push(Self::assemble(row, items)?);
        }
        Ok(orders)
    }

    async fn count_active_for_restaurant(&self, restaurant_id: Uuid) -> Result<u32, RepoError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE restaurant_id = $1 \
             AND status NOT IN ('DELIVERED', 'CANCELLED', 'REFUNDED')",
        )
        .bind(restaurant_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u32)
    }

    async fn list_delivered_since(
        &self,
        restaurant_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepoError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE restaurant_id = $1 \
             AND status = 'DELIVERED' AND created_at >= $2"
        ))
        .bind(restaurant_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(row.id).await?;
            orders.push(Self::assemble(row, items)?);
        }
        Ok(orders)
    }

    async fn add_order_change(&self, change: &OrderChange) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO order_changes (id, order_id, change_type, old_value, new_value, actor, \
             note, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(change.id)
        .bind(change.order_id)
        .bind(&change.change_type)
        .bind(&change.old_value)
        .bind(&change.new_value)
        .bind(&change.actor)
        .bind(&change.note)
        .bind(change.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
