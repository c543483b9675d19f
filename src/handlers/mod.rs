//! HTTP request handlers (route handlers).
//!
//! Each handler is a thin async function: deserialize the request, call the
//! ledger or stats service, wrap the result in the response envelope.
//! Success responses are `{"success": true, ...payload}`; failures are
//! produced by [`AppError`](crate::error::AppError)'s `IntoResponse`.

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::{LedgerService, StatsService};
use crate::store::Store;

/// Destructive admin escape hatches
pub mod admin;
/// Liveness and store connectivity
pub mod health;
/// Order creation and status management
pub mod orders;
/// Dashboard statistics and integrity checks
pub mod stats;
/// User accounts and balance operations
pub mod users;

/// Shared handler state: the two services plus the raw store handle the
/// health endpoint pings.
#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerService,
    pub stats: StatsService,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            ledger: LedgerService::new(Arc::clone(&store)),
            stats: StatsService::new(Arc::clone(&store)),
            store,
        }
    }
}

/// Build the application router: one route per ledger or stats operation.
///
/// CORS is permissive because the operator dashboard is served from a
/// separate origin.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        // User management
        .route("/api/v1/users", post(users::create_user))
        .route("/api/v1/users", get(users::list_users))
        .route("/api/v1/users/{id}", get(users::get_user))
        .route("/api/v1/users/{id}/username", put(users::set_username))
        .route("/api/v1/users/{id}/balance", get(users::get_balance))
        .route("/api/v1/users/{id}/balance", post(users::adjust_balance))
        .route("/api/v1/users/{id}/orders", get(orders::list_user_orders))
        // Orders
        .route("/api/v1/orders", post(orders::create_order))
        .route("/api/v1/orders", get(orders::list_orders))
        .route("/api/v1/orders/{id}", get(orders::get_order))
        .route("/api/v1/orders/{id}/status", put(orders::update_order_status))
        // Balance batch operations
        .route("/api/v1/balance/transfer", post(users::transfer_balance))
        .route("/api/v1/balance/bulk-add", post(users::bulk_add_balance))
        // Statistics
        .route("/api/v1/stats", get(stats::all_stats))
        .route("/api/v1/stats/orders", get(stats::order_stats))
        .route("/api/v1/stats/users", get(stats::user_stats))
        // Integrity verification
        .route("/api/v1/verify/users/{id}", get(stats::verify_user))
        .route("/api/v1/verify/orders/{id}", get(stats::verify_order))
        // Admin escape hatches
        .route("/api/v1/admin/users/{id}", delete(admin::delete_user))
        .route("/api/v1/admin/orders/{id}", delete(admin::delete_order))
        // Request tracing for observability
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
