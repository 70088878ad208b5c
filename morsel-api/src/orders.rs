use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use morsel_order::models::{
    Customer, DeliveryAddress, NewOrder, Order, OrderItem, OrderStatus, PaymentMethod,
    SettlementSnapshot,
};
use morsel_shared::pii::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub restaurant_id: Uuid,
    pub items: Vec<CreateOrderItem>,
    pub customer: CustomerPayload,
    pub delivery_address: AddressPayload,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderItem {
    pub product_id: Uuid,
    pub quantity: u32,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerPayload {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AddressPayload {
    pub street: String,
    pub city: String,
    pub postal_code: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub new_status: String,
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub customer_id: String,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub customer_id: String,
    pub customer_name: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total: f64,
    pub payment_method: PaymentMethod,
    pub settlement: SettlementSnapshot,
    pub delivery_address: String,
    pub estimated_delivery_at: Option<chrono::DateTime<Utc>>,
    pub actual_delivery_at: Option<chrono::DateTime<Utc>>,
    pub special_instructions: Option<String>,
    pub transaction_id: Option<Uuid>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub line_total: f64,
    pub note: Option<String>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            restaurant_id: order.restaurant_id,
            customer_id: order.customer.id,
            customer_name: order.customer.name,
            status: order.status,
            items: order
                .items
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id,
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    line_total: item.line_total(),
                    note: item.note.clone(),
                })
                .collect(),
            subtotal: order.subtotal,
            delivery_fee: order.delivery_fee,
            total: order.total,
            payment_method: order.payment_method,
            settlement: order.settlement,
            delivery_address: order.delivery_address.summary_line(),
            estimated_delivery_at: order.estimated_delivery_at,
            actual_delivery_at: order.actual_delivery_at,
            special_instructions: order.special_instructions,
            transaction_id: order.transaction_id,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Create an order: snapshot the catalog products, estimate delivery,
/// compute the settlement split and persist in PENDING
pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    if req.items.is_empty() {
        return Err(AppError::ValidationError("order has no items".to_string()));
    }

    // 1. Resolve and snapshot catalog products
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

        if !product.is_active {
            return Err(AppError::ValidationError(format!(
                "product is not orderable: {}",
                product.name
            )));
        }
        if product.restaurant_id != req.restaurant_id {
            return Err(AppError::ValidationError(format!(
                "product {} belongs to another restaurant",
                product.name
            )));
        }

        items.push(OrderItem {
            product_id: product.id,
            name: product.name,
            category: product.category,
            unit_price: product.price,
            quantity: line.quantity,
            note: line.note.clone(),
        });
    }

    let delivery_address = DeliveryAddress {
        street: req.delivery_address.street,
        city: req.delivery_address.city,
        postal_code: req.delivery_address.postal_code,
        lat: req.delivery_address.lat,
        lng: req.delivery_address.lng,
    };

    // 2. Estimate delivery; the predictor degrades internally, never errors
    let prediction = state
        .predictor
        .predict(req.restaurant_id, &delivery_address, &items, Utc::now())
        .await;
    let estimated_delivery_at =
        Utc::now() + Duration::minutes(prediction.estimated_minutes as i64);

    // 3. Hand off to the lifecycle manager
    let order = state
        .lifecycle
        .create_order(NewOrder {
            customer: Customer {
                id: req.customer.id,
                name: req.customer.name,
                phone: Masked(req.customer.phone),
                email: Masked(req.customer.email),
            },
            restaurant_id: req.restaurant_id,
            items,
            delivery_fee: state.business_rules.delivery_fee,
            payment_method: req.payment_method,
            delivery_address,
            special_instructions: req.notes,
            estimated_delivery_at: Some(estimated_delivery_at),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /v1/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state.lifecycle.get_order(order_id).await?;
    Ok(Json(order.into()))
}

/// GET /v1/orders?customer_id=
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = state
        .orders
        .list_for_customer(&query.customer_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// POST /v1/orders/{id}/status
/// Apply a lifecycle transition on behalf of `actor`
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let new_status: OrderStatus = req
        .new_status
        .parse()
        .map_err(AppError::ValidationError)?;

    let order = state
        .lifecycle
        .update_status(order_id, new_status, &req.actor)
        .await?;

    Ok(Json(order.into()))
}
