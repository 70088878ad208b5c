use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use morsel_order::finance::RevenueReport;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// GET /v1/finance/revenue?from=&to=
/// Roll completed settlements up into a revenue report; defaults to the
/// trailing 30 days
pub async fn revenue_report(
    State(state): State<AppState>,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<RevenueReport>, AppError> {
    let to = query.to.unwrap_or_else(Utc::now);
    let from = query.from.unwrap_or(to - Duration::days(30));
    if from >= to {
        return Err(AppError::ValidationError(
            "`from` must precede `to`".to_string(),
        ));
    }

    let transactions = state
        .transactions
        .list_completed_between(from, to)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(RevenueReport::from_transactions(&transactions, from, to)))
}
