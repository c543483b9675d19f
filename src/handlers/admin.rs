//! Destructive admin endpoints.
//!
//! Hard deletes are an escape hatch for operator tooling, not part of the
//! normal lifecycle. Deleting a user does not touch their orders, and
//! deleting an order does not restore the balance it debited.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use super::AppState;
use crate::error::AppError;

/// Hard-delete a user. May leave their orders dangling.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.ledger.delete_user(&id).await?;
    Ok(Json(json!({ "success": true })))
}

/// Hard-delete an order.
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.ledger.delete_order(&id).await?;
    Ok(Json(json!({ "success": true })))
}
