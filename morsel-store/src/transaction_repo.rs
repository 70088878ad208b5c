use async_trait::async_trait;
use chrono::{DateTime, Utc};
use morsel_order::models::Transaction;
use morsel_order::repository::{RepoError, TransactionRepository};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    order_id: Uuid,
    restaurant_id: Uuid,
    gross_amount: f64,
    commission_amount: f64,
    restaurant_amount: f64,
    payment_method: String,
    status: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TransactionRow {
    fn into_transaction(self) -> Result<Transaction, RepoError> {
        Ok(Transaction {
            id: self.id,
            order_id: self.order_id,
            restaurant_id: self.restaurant_id,
            gross_amount: self.gross_amount,
            commission_amount: self.commission_amount,
            restaurant_amount: self.restaurant_amount,
            payment_method: self.payment_method.parse()?,
            status: self.status.parse()?,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

const TRANSACTION_COLUMNS: &str = "id, order_id, restaurant_id, gross_amount, commission_amount, \
     restaurant_amount, payment_method, status, created_at, completed_at";

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn create_if_absent(&self, transaction: &Transaction) -> Result<bool, RepoError> {
        // The UNIQUE constraint on order_id arbitrates concurrent duplicate
        // delivery confirmations; losers insert zero rows.
        let result = sqlx::query(
            "INSERT INTO transactions (id, order_id, restaurant_id, gross_amount, \
             commission_amount, restaurant_amount, payment_method, status, created_at, \
             completed_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (order_id) DO NOTHING",
        )
        .bind(transaction.id)
        .bind(transaction.order_id)
        .bind(transaction.restaurant_id)
        .bind(transaction.gross_amount)
        .bind(transaction.commission_amount)
        .bind(transaction.restaurant_amount)
        .bind(transaction.payment_method.as_str())
        .bind(transaction.status.as_str())
        .bind(transaction.created_at)
        .bind(transaction.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_for_order(&self, order_id: Uuid) -> Result<Option<Transaction>, RepoError> {
        let row = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TransactionRow::into_transaction).transpose()
    }

    async fn list_completed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>, RepoError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE status = 'COMPLETED' AND created_at >= $1 AND created_at < $2 \
             ORDER BY created_at"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(TransactionRow::into_transaction)
            .collect()
    }
}
