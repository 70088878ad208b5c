use axum::{extract::State, Json};
use chrono::Utc;
use morsel_insight::{Prediction, Recommendation};
use morsel_order::models::{DeliveryAddress, OrderItem};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DeliveryEstimateRequest {
    pub restaurant_id: Uuid,
    pub delivery_address: crate::orders::AddressPayload,
    pub items: Vec<EstimateItem>,
}

#[derive(Debug, Deserialize)]
pub struct EstimateItem {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsRequest {
    pub customer_id: String,
    pub restaurant_id: Uuid,
    #[serde(default)]
    pub cart: Vec<Uuid>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/insights/delivery-estimate
pub async fn delivery_estimate(
    State(state): State<AppState>,
    Json(req): Json<DeliveryEstimateRequest>,
) -> Result<Json<Prediction>, AppError> {
    let mut items = Vec::with_capacity(req.items.len());
    for line in &req.items {
        let product = state
            .catalog
            .get_product(line.product_id)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?
            .ok_or_else(|| {
                AppError::ValidationError(format!("unknown product: {}", line.product_id))
            })?;
        items.push(OrderItem {
            product_id: product.id,
            name: product.name,
            category: product.category,
            unit_price: product.price,
            quantity: line.quantity,
            note: None,
        });
    }

    let address = DeliveryAddress {
        street: req.delivery_address.street,
        city: req.delivery_address.city,
        postal_code: req.delivery_address.postal_code,
        lat: req.delivery_address.lat,
        lng: req.delivery_address.lng,
    };

    let prediction = state
        .predictor
        .predict(req.restaurant_id, &address, &items, Utc::now())
        .await;

    Ok(Json(prediction))
}

/// POST /v1/insights/recommendations
/// Cached per customer/restaurant pair; the cache fails open so a Redis
/// outage only costs recomputation
pub async fn recommendations(
    State(state): State<AppState>,
    Json(req): Json<RecommendationsRequest>,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    let restaurant_key = req.restaurant_id.simple().to_string();

    // Only cache cart-independent requests; cart contents shift per call
    let cacheable = req.cart.is_empty();
    if cacheable {
        if let Some(redis) = &state.redis {
            if let Ok(Some(cached)) = redis
                .get_cached_recommendations(&req.customer_id, &restaurant_key)
                .await
            {
                if let Ok(parsed) = serde_json::from_str::<Vec<Recommendation>>(&cached) {
                    return Ok(Json(parsed));
                }
            }
        }
    }

    let recommendations = state
        .recommender
        .recommend(&req.customer_id, &req.cart, req.restaurant_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    if cacheable {
        if let Some(redis) = &state.redis {
            if let Ok(payload) = serde_json::to_string(&recommendations) {
                if let Err(err) = redis
                    .set_cached_recommendations(
                        &req.customer_id,
                        &restaurant_key,
                        &payload,
                        state.business_rules.recommendation_cache_seconds,
                    )
                    .await
                {
                    tracing::warn!(error = %err, "failed to cache recommendations");
                }
            }
        }
    }

    Ok(Json(recommendations))
}
