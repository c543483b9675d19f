//! Statistics and integrity-check HTTP handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use super::AppState;
use crate::error::AppError;

/// Order counters and total revenue.
pub async fn order_stats(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let stats = state.stats.order_stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// User count and total balance held.
pub async fn user_stats(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let stats = state.stats.user_stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// Both stat blocks in one response, for the dashboard landing page.
pub async fn all_stats(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let orders = state.stats.order_stats().await?;
    let users = state.stats.user_stats().await?;
    Ok(Json(json!({ "success": true, "orders": orders, "users": users })))
}

/// Integrity-check a stored user document.
pub async fn verify_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let report = state.stats.verify_user(&id).await?;
    Ok(Json(json!({ "success": true, "report": report })))
}

/// Integrity-check a stored order document.
pub async fn verify_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let report = state.stats.verify_order(&id).await?;
    Ok(Json(json!({ "success": true, "report": report })))
}
