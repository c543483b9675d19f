//! User management HTTP handlers.
//!
//! This module implements the user-facing API endpoints:
//! - POST /api/v1/users - Create (idempotently) a user
//! - GET /api/v1/users - List all users
//! - GET /api/v1/users/:id - Get one user
//! - PUT /api/v1/users/:id/username - Assign the set-once username
//! - GET /api/v1/users/:id/balance - Read the balance
//! - POST /api/v1/users/:id/balance - Add / set / deduct balance
//! - POST /api/v1/balance/transfer - Move balance between users
//! - POST /api/v1/balance/bulk-add - Credit several users

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use super::AppState;
use crate::{
    error::AppError,
    models::user::{
        BalanceOperationRequest, BulkAddRequest, CreateUserRequest, SetUsernameRequest,
        TransferRequest,
    },
};

/// Create a user.
///
/// Idempotent: posting the same id twice returns the existing record with
/// its balance untouched.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "success": true,
///   "user": {
///     "id": "u1",
///     "email": "u1@example.com",
///     "username": null,
///     "balance_cents": 0,
///     "created_at": "2025-06-01T10:00:00Z",
///     "updated_at": "2025-06-01T10:00:00Z"
///   }
/// }
/// ```
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<Value>, AppError> {
    let user = state.ledger.create_user(&request.id, &request.email).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

/// Get one user by id. 404 when absent.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user = state.ledger.get_user(&id).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

/// List every user.
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let users = state.stats.list_users().await?;
    Ok(Json(json!({ "success": true, "users": users })))
}

/// Assign the set-once username.
///
/// 400 with "username already set" when it was assigned before; racing
/// assignments have exactly one winner.
pub async fn set_username(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetUsernameRequest>,
) -> Result<Json<Value>, AppError> {
    let user = state.ledger.set_username(&id, &request.username).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

/// Read the current balance.
pub async fn get_balance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let balance_cents = state.ledger.get_balance(&id).await?;
    Ok(Json(json!({ "success": true, "balance_cents": balance_cents })))
}

/// Apply a balance operation carried in the `action` discriminator.
///
/// # Request Body
///
/// ```json
/// {
///   "action": "deduct",
///   "amount_cents": 6000
/// }
/// ```
///
/// `deduct` beyond the balance fails with 400 and leaves the balance
/// untouched.
pub async fn adjust_balance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<BalanceOperationRequest>,
) -> Result<Json<Value>, AppError> {
    let balance_cents = state
        .ledger
        .adjust_balance(&id, request.amount_cents, request.action)
        .await?;
    Ok(Json(json!({ "success": true, "balance_cents": balance_cents })))
}

/// Move balance between two users atomically.
pub async fn transfer_balance(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .ledger
        .transfer_balance(
            &request.from_user_id,
            &request.to_user_id,
            request.amount_cents,
        )
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// Credit several users at once; the response maps each id to whether it
/// was found.
pub async fn bulk_add_balance(
    State(state): State<AppState>,
    Json(request): Json<BulkAddRequest>,
) -> Result<Json<Value>, AppError> {
    let results = state
        .ledger
        .bulk_add_balance(&request.user_ids, request.amount_cents)
        .await?;
    Ok(Json(json!({ "success": true, "results": results })))
}
