use crate::models::{Transaction, TransactionStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Revenue rollup over completed settlement transactions.
///
/// Used for reporting only; order processing never reads it.
#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub transaction_count: usize,
    pub total_revenue: f64,
    pub total_commission: f64,
    pub total_restaurant_earning: f64,
    pub by_payment_method: BTreeMap<String, MethodBreakdown>,
    pub by_day: BTreeMap<NaiveDate, DayBreakdown>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MethodBreakdown {
    pub transaction_count: usize,
    pub revenue: f64,
    pub commission: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DayBreakdown {
    pub transaction_count: usize,
    pub revenue: f64,
    pub commission: f64,
}

impl RevenueReport {
    pub fn from_transactions(
        transactions: &[Transaction],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Self {
        let mut report = Self {
            from,
            to,
            transaction_count: 0,
            total_revenue: 0.0,
            total_commission: 0.0,
            total_restaurant_earning: 0.0,
            by_payment_method: BTreeMap::new(),
            by_day: BTreeMap::new(),
        };

        for transaction in transactions {
            if transaction.status != TransactionStatus::Completed {
                continue;
            }
            if transaction.created_at < from || transaction.created_at >= to {
                continue;
            }

            report.transaction_count += 1;
            report.total_revenue += transaction.gross_amount;
            report.total_commission += transaction.commission_amount;
            report.total_restaurant_earning += transaction.restaurant_amount;

            let method = report
                .by_payment_method
                .entry(transaction.payment_method.as_str().to_string())
                .or_default();
            method.transaction_count += 1;
            method.revenue += transaction.gross_amount;
            method.commission += transaction.commission_amount;

            let day = report
                .by_day
                .entry(transaction.created_at.date_naive())
                .or_default();
            day.transaction_count += 1;
            day.revenue += transaction.gross_amount;
            day.commission += transaction.commission_amount;
        }

        report
    }
}
