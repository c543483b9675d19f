//! Order HTTP handlers.
//!
//! This module implements the order-related API endpoints:
//! - POST /api/v1/orders - Place an order (debits the balance)
//! - GET /api/v1/orders - List orders, optionally filtered by status
//! - GET /api/v1/orders/:id - Get one order
//! - PUT /api/v1/orders/:id/status - Set the fulfillment status
//! - GET /api/v1/users/:id/orders - One user's orders

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};

use super::AppState;
use crate::{
    error::AppError,
    models::order::{CreateOrderRequest, ListOrdersQuery, UpdateOrderStatusRequest},
};

/// Place an order.
///
/// The balance check, the debit, and the order insert happen in one store
/// commit; a failure leaves everything as it was.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "success": true,
///   "order": {
///     "id": "d9e7d1f2-...",
///     "user_id": "u1",
///     "service": "Instagram Followers",
///     "amount_cents": 8000,
///     "quantity": 1000,
///     "status": "pending",
///     "created_at": "2025-06-01T10:00:00Z",
///     "updated_at": "2025-06-01T10:00:00Z"
///   }
/// }
/// ```
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<Json<Value>, AppError> {
    let order = state.ledger.create_order(request).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

/// List orders, newest first. `?status=pending` restricts to one status.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Value>, AppError> {
    let orders = state.stats.list_orders(query.status).await?;
    Ok(Json(json!({ "success": true, "orders": orders })))
}

/// Get one order by id. 404 when absent.
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let order = state.ledger.get_order(&id).await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

/// List one user's orders, newest first.
pub async fn list_user_orders(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let orders = state.stats.list_orders_for_user(&id).await?;
    Ok(Json(json!({ "success": true, "orders": orders })))
}

/// Set an order's status (operator action).
///
/// Any of the three statuses is accepted from any current status. No
/// balance side effects.
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Value>, AppError> {
    state.ledger.update_order_status(&id, request.status).await?;
    Ok(Json(json!({ "success": true })))
}
