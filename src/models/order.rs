//! Order data model and API request types.
//!
//! This module defines:
//! - `Order`: document stored in the `orders` collection
//! - `OrderStatus`: the three-state fulfillment status
//! - Request types for order creation and status updates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Collection holding order documents, keyed by a store-generated id.
pub const ORDERS_COLLECTION: &str = "orders";

/// Smallest amount the panel sells an order for, in cents.
///
/// Not enforced on the write path; integrity verification flags orders
/// below it.
pub const MIN_ORDER_AMOUNT_CENTS: i64 = 3000;

/// Fulfillment status of an order.
///
/// Transitions are deliberately unrestricted: the operator panel re-sets
/// status freely, including moving a completed order back to pending.
/// No transition touches the user's balance, `rejected` included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Rejected => "rejected",
        }
    }
}

/// Represents an order document.
///
/// The amount was debited from the user's balance in the same store commit
/// that inserted this document; it is fixed at creation and never
/// recomputed. The descriptive fields (`service`, `platform`, `plan`,
/// `target`, `utr`) are opaque to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Store-generated identifier
    pub id: String,

    /// Id of the user the order was charged to
    ///
    /// The user existed when the order was created; an admin hard-delete
    /// can later orphan this reference.
    pub user_id: String,

    /// Snapshot of the user's username at creation, for operator dashboards
    pub username: Option<String>,

    /// Human-readable service label, e.g. "Instagram Followers"
    pub service: String,

    /// Catalog identifier for the service
    #[serde(default)]
    pub service_id: String,

    /// Platform the service targets
    pub platform: String,

    /// Plan tier, e.g. "normal" or "premium"
    pub plan: String,

    /// Account or URL the service is delivered to
    pub target: String,

    /// Payment reference supplied by the user
    #[serde(default)]
    pub utr: String,

    /// Amount charged, in cents; fixed at creation
    pub amount_cents: i64,

    /// Units ordered; always positive
    pub quantity: u32,

    /// Current fulfillment status; new orders start `pending`
    pub status: OrderStatus,

    /// Timestamp when the order was created
    pub created_at: DateTime<Utc>,

    /// Timestamp of the last status change
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating an order.
///
/// ```json
/// {
///   "user_id": "u1",
///   "service": "Instagram Followers",
///   "service_id": "instagram_followers",
///   "platform": "Instagram",
///   "plan": "normal",
///   "target": "someaccount",
///   "utr": "TXN123456",
///   "amount_cents": 8000,
///   "quantity": 1000
/// }
/// ```
///
/// # Validation
///
/// - `quantity` must be positive
/// - `amount_cents` must be positive
/// - the user must exist and hold at least `amount_cents`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub service: String,
    #[serde(default)]
    pub service_id: String,
    pub platform: String,
    pub plan: String,
    pub target: String,
    #[serde(default)]
    pub utr: String,
    pub amount_cents: i64,
    pub quantity: u32,
}

/// Request body for the status endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Query parameters accepted when listing orders.
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<OrderStatus>,
}
